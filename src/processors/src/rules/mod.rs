//! Stateful detectors deciding when alerts are raised and cleared.
//!
//! Every detector answers "is the condition active" for one vessel snapshot. The evaluator keeps
//! the set of active conditions per vessel and only reports the edges: a `Raise` when a
//! condition turns active and a `Clear` when it stops being active.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use fleet_core::{AlertKind, Geofence, Mmsi, VesselState};
use tokio::sync::Mutex;

use crate::{Result, TrackerSettings};

mod anchored;
mod geofence;
mod speed_anomaly;

pub use anchored::*;
pub use geofence::*;
pub use speed_anomaly::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleTransition {
    Raise { kind: AlertKind, message: String },
    Clear { kind: AlertKind },
}

#[derive(Debug, Default)]
struct VesselRules {
    revision: Option<u64>,
    active: HashSet<AlertKind>,
    speed: SpeedHistory,
}

pub struct RuleEvaluator {
    geofence_breach: GeofenceBreach,
    anchored_too_long: AnchoredTooLong,
    speed_anomaly: SpeedAnomaly,
    vessels: Mutex<HashMap<Mmsi, VesselRules>>,
}

impl RuleEvaluator {
    pub fn new(
        geofence_breach: GeofenceBreach,
        anchored_too_long: AnchoredTooLong,
        speed_anomaly: SpeedAnomaly,
    ) -> Self {
        Self {
            geofence_breach,
            anchored_too_long,
            speed_anomaly,
            vessels: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &TrackerSettings, geofences: Vec<Geofence>) -> Self {
        Self::new(
            GeofenceBreach::new(geofences),
            AnchoredTooLong {
                threshold: settings.anchored_too_long_threshold,
            },
            SpeedAnomaly {
                delta_knots: settings.speed_anomaly_delta_knots,
                ratio: settings.speed_anomaly_ratio,
                window: settings.speed_anomaly_window,
                unrealistic_speed_knots: settings.unrealistic_speed_knots,
            },
        )
    }

    /// Evaluates every detector against `vessel` as of `now` and returns the resulting edges.
    ///
    /// Snapshots older than one already evaluated for the same vessel are ignored. On error the
    /// active set of the vessel is left as it was.
    pub async fn evaluate(
        &self,
        vessel: &VesselState,
        now: DateTime<Utc>,
    ) -> Result<Vec<RuleTransition>> {
        let mut vessels = self.vessels.lock().await;
        let rules = vessels.entry(vessel.mmsi).or_default();

        if rules.revision.is_some_and(|r| vessel.revision < r) {
            return Ok(vec![]);
        }
        rules.revision = Some(vessel.revision);

        let speed_anomaly = self.speed_anomaly.is_active(vessel, &mut rules.speed)?;

        let conditions = [
            (
                AlertKind::GeofenceBreach,
                self.geofence_breach
                    .breached(vessel)
                    .map(|g| GeofenceBreach::message(vessel, g)),
            ),
            (
                AlertKind::AnchoredTooLong,
                self.anchored_too_long
                    .is_active(vessel, now)
                    .then(|| self.anchored_too_long.message(vessel)),
            ),
            (
                AlertKind::SpeedAnomaly,
                speed_anomaly.then(|| SpeedAnomaly::message(vessel)),
            ),
        ];

        let mut transitions = Vec::new();
        for (kind, condition) in conditions {
            let was_active = rules.active.contains(&kind);
            match (was_active, condition) {
                (false, Some(message)) => {
                    rules.active.insert(kind);
                    transitions.push(RuleTransition::Raise { kind, message });
                }
                (true, None) => {
                    rules.active.remove(&kind);
                    transitions.push(RuleTransition::Clear { kind });
                }
                (true, Some(_)) | (false, None) => {}
            }
        }

        Ok(transitions)
    }

    /// Drops all state kept for `mmsi` and returns the conditions that were active.
    pub async fn forget(&self, mmsi: Mmsi) -> Vec<AlertKind> {
        let mut active: Vec<AlertKind> = self
            .vessels
            .lock()
            .await
            .remove(&mmsi)
            .map(|r| r.active.into_iter().collect())
            .unwrap_or_default();
        active.sort();
        active
    }

    pub async fn active(&self, mmsi: Mmsi) -> Vec<AlertKind> {
        let mut active: Vec<AlertKind> = self
            .vessels
            .lock()
            .await
            .get(&mmsi)
            .map(|r| r.active.iter().copied().collect())
            .unwrap_or_default();
        active.sort();
        active
    }
}

#[cfg(test)]
impl RuleEvaluator {
    /// Replaces the speed history of `mmsi` as if `previous` was its last report.
    pub(crate) async fn set_previous_report(&self, mmsi: Mmsi, previous: SpeedItem) {
        self.vessels.lock().await.entry(mmsi).or_default().speed =
            SpeedHistory::with_previous(previous);
    }
}
