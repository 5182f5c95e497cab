use fleet_core::Mmsi;
use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Fleet domain operation failed"))]
    Core {
        #[snafu(implicit)]
        location: Location,
        source: fleet_core::Error,
    },
    #[snafu(display("Failed to estimate speed of '{mmsi}' from '{from:?}' to '{to:?}': '{speed}'"))]
    SpeedEstimation {
        #[snafu(implicit)]
        location: Location,
        mmsi: Mmsi,
        from: fleet_core::Position,
        to: fleet_core::Position,
        speed: f64,
    },
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Core { source, .. } => source.is_not_found(),
            Error::SpeedEstimation { .. } => false,
        }
    }
}
