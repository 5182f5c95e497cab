use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::{CoreResult, core_error::InvalidTransitionSnafu};

/// Health of the upstream ingest channel.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    AsRefStr,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ConnectionState {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionEvent {
    HandshakeSucceeded,
    UpstreamFailed,
    HeartbeatTimedOut,
    RetryElapsed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// When the most recent report was successfully processed.
    pub last_update_at: Option<DateTime<Utc>>,
}

impl ConnectionState {
    pub fn transition(self, event: ConnectionEvent) -> CoreResult<ConnectionState> {
        use ConnectionEvent::*;
        use ConnectionState::*;

        match (self, event) {
            (Connecting, HandshakeSucceeded) => Ok(Connected),
            (Connecting | Connected, UpstreamFailed | HeartbeatTimedOut) => Ok(Disconnected),
            (Disconnected, RetryElapsed) => Ok(Connecting),
            (Connecting, RetryElapsed)
            | (Connected, HandshakeSucceeded | RetryElapsed)
            | (Disconnected, HandshakeSucceeded | UpstreamFailed | HeartbeatTimedOut) => {
                InvalidTransitionSnafu { from: self, event }.fail()
            }
        }
    }
}
