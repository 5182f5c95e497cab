use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Alert, AlertKind, ConnectionState, Mmsi, VesselState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    pub moving: usize,
    pub stationary: usize,
}

/// Everything a display needs to render the fleet at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSnapshot {
    pub vessels: Vec<VesselState>,
    /// Open alerts, newest first.
    pub alerts: Vec<Alert>,
    pub connection_state: ConnectionState,
    pub last_update_at: Option<DateTime<Utc>>,
    pub summary: FleetSummary,
    pub generated_at: DateTime<Utc>,
}

/// Pushed to broadcast subscribers, snapshots on every tick and alert changes as they happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum FleetEvent {
    Snapshot(Box<FleetSnapshot>),
    AlertRaised(Alert),
    AlertCleared { mmsi: Mmsi, kind: AlertKind },
}

impl FleetSummary {
    pub fn from_vessels<'a>(vessels: impl IntoIterator<Item = &'a VesselState>) -> Self {
        vessels
            .into_iter()
            .fold(FleetSummary::default(), |mut summary, v| {
                if v.is_moving() {
                    summary.moving += 1;
                } else {
                    summary.stationary += 1;
                }
                summary
            })
    }
}
