pub mod filter;
pub mod picking;
pub mod profile;
pub mod selection;

pub use filter::*;
pub use picking::*;
pub use profile::*;
pub use selection::*;
