#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Domain types shared by the fleet tracker crates: vessel state, position reports, alerts,
//! geofences and the snapshot/event payloads handed to display collaborators.

mod domain;
mod error;

pub use domain::*;
pub use error::*;
