mod alert;
mod connection;
mod geofence;
mod report;
mod snapshot;
mod vessel;

pub use alert::*;
pub use connection::*;
pub use geofence::*;
pub use report::*;
pub use snapshot::*;
pub use vessel::*;
