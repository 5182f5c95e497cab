use snafu::{Location, Snafu};

use crate::{AlertId, ConnectionEvent, ConnectionState, Mmsi};

pub type CoreResult<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module(core_error), visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid report from vessel '{mmsi}', '{field}' is out of range: '{value}'"))]
    InvalidReport {
        #[snafu(implicit)]
        location: Location,
        mmsi: Mmsi,
        field: &'static str,
        value: f64,
    },
    #[snafu(display("Could not find vessel '{mmsi}'"))]
    VesselNotFound {
        #[snafu(implicit)]
        location: Location,
        mmsi: Mmsi,
    },
    #[snafu(display("Could not find alert '{id}'"))]
    AlertNotFound {
        #[snafu(implicit)]
        location: Location,
        id: AlertId,
    },
    #[snafu(display("Invalid geofence '{id}': {reason}"))]
    InvalidGeofence {
        #[snafu(implicit)]
        location: Location,
        id: String,
        reason: String,
    },
    #[snafu(display("Connection cannot handle '{event}' while '{from}'"))]
    InvalidTransition {
        #[snafu(implicit)]
        location: Location,
        from: ConnectionState,
        event: ConnectionEvent,
    },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::VesselNotFound { .. } | Error::AlertNotFound { .. }
        )
    }
}
