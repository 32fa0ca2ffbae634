//! Selection and data synchronization core for the ARGO float dashboard.
//!
//! `Dashboard` owns the filter and selection state, talks to the backend only
//! through `RemoteData`, and exposes map/table/chart projections derived on
//! read. Remote results flow back in through tagged deliveries, so a late
//! answer to an outdated question never overwrites the current view.

pub mod composer;
pub mod config;
pub mod fetch;
pub mod remote;
pub mod views;

pub use composer::*;
pub use config::*;
pub use fetch::*;
pub use remote::*;
pub use views::*;
