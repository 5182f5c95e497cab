#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Vessel tracking pipeline: the record store, dead reckoning, alert rules, the alert ledger and
//! the upstream connection state, orchestrated by [`Tracker`] and driven by a [`TickLoop`].

mod connection;
pub mod error;
mod kinematics;
mod ledger;
mod rules;
mod scheduler;
mod settings;
mod store;
mod tracker;

pub use connection::*;
pub use error::*;
pub use kinematics::*;
pub use ledger::*;
pub use rules::*;
pub use scheduler::*;
pub use settings::*;
pub use store::*;
pub use tracker::*;
