//! Read-side projections of the profile list for each dashboard view.
//!
//! Everything here is a pure function of the current list and selection.
//! Nothing is stored, so the views can never disagree with each other.

pub mod chart;
pub mod markers;
pub mod table;

pub use chart::*;
pub use markers::*;
pub use table::*;
