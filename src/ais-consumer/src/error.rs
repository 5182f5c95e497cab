use std::time::Duration;

use fleet_core::ConnectionEvent;
use reqwest::StatusCode;
use snafu::{Location, Snafu};
use tokio_util::codec::LinesCodecError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Upstream ais stream closed unexpectedly"))]
    StreamClosed {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("No message received from upstream within '{timeout:?}'"))]
    HeartbeatTimeout {
        #[snafu(implicit)]
        location: Location,
        timeout: Duration,
    },
    #[snafu(display("Failed to send request to upstream"))]
    Request {
        #[snafu(implicit)]
        location: Location,
        source: reqwest::Error,
    },
    #[snafu(display("Upstream request failed, status: '{status}', url: '{url}', body: '{body}'"))]
    FailedRequest {
        #[snafu(implicit)]
        location: Location,
        url: String,
        status: StatusCode,
        body: String,
    },
    #[snafu(display("No upstream address configured for environment '{environment}'"))]
    MissingAddress {
        #[snafu(implicit)]
        location: Location,
        environment: String,
    },
    #[snafu(display("Failed to set up the tracker"))]
    Tracker {
        #[snafu(implicit)]
        location: Location,
        source: processors::Error,
    },
}

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum AisMessageError {
    #[snafu(display("Failed to read line from upstream"))]
    Line {
        #[snafu(implicit)]
        location: Location,
        source: LinesCodecError,
    },
    #[snafu(display("Failed to deserialize ais message '{message}'"))]
    Deserialize {
        #[snafu(implicit)]
        location: Location,
        message: String,
        source: serde_json::Error,
    },
}

impl Error {
    /// The connection event this failure represents.
    pub fn connection_event(&self) -> ConnectionEvent {
        match self {
            Error::HeartbeatTimeout { .. } => ConnectionEvent::HeartbeatTimedOut,
            Error::StreamClosed { .. }
            | Error::Request { .. }
            | Error::FailedRequest { .. }
            | Error::MissingAddress { .. }
            | Error::Tracker { .. } => ConnectionEvent::UpstreamFailed,
        }
    }
}
