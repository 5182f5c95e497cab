use std::time::Duration;

use chrono::{DateTime, Utc};
use fleet_core::{Mmsi, Position, VesselState};

use crate::{Result, error::error::SpeedEstimationSnafu, kinematics::distance_nautical_miles};

/// Flags implausible AIS data or hard manoeuvres by comparing consecutive reports of a vessel.
#[derive(Debug, Clone)]
pub struct SpeedAnomaly {
    pub delta_knots: f64,
    pub ratio: Option<f64>,
    /// Reports further apart than this are never compared.
    pub window: Duration,
    /// Implied speed between two reported positions that no vessel can reach.
    pub unrealistic_speed_knots: f64,
}

impl Default for SpeedAnomaly {
    fn default() -> Self {
        SpeedAnomaly {
            delta_knots: 10.0,
            ratio: None,
            window: Duration::from_secs(10 * 60),
            unrealistic_speed_knots: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeedItem {
    pub position: Position,
    pub speed: f64,
    pub timestamp: DateTime<Utc>,
}

/// The only history kept per vessel, the last report and the verdict it produced.
#[derive(Debug, Clone, Default)]
pub struct SpeedHistory {
    previous: Option<SpeedItem>,
    active: bool,
}

#[cfg(test)]
impl SpeedHistory {
    pub(crate) fn with_previous(previous: SpeedItem) -> SpeedHistory {
        SpeedHistory {
            previous: Some(previous),
            active: false,
        }
    }
}

impl From<&VesselState> for SpeedItem {
    fn from(value: &VesselState) -> Self {
        SpeedItem {
            position: value.reported_position,
            speed: value.speed_over_ground,
            timestamp: value.last_report_at,
        }
    }
}

impl SpeedAnomaly {
    /// Only a new report changes the verdict, snapshots produced by ticks share the last report
    /// and keep it.
    pub fn is_active(&self, vessel: &VesselState, history: &mut SpeedHistory) -> Result<bool> {
        let current = SpeedItem::from(vessel);

        let previous = match history.previous.take() {
            Some(prev) if current.timestamp <= prev.timestamp => {
                history.previous = Some(prev);
                return Ok(history.active);
            }
            previous => previous,
        };

        history.previous = Some(current.clone());

        let Some(previous) = previous else {
            return Ok(false);
        };

        history.active = self.is_anomalous(vessel.mmsi, &previous, &current)?;
        Ok(history.active)
    }

    fn is_anomalous(&self, mmsi: Mmsi, previous: &SpeedItem, current: &SpeedItem) -> Result<bool> {
        let within_window = (current.timestamp - previous.timestamp)
            .to_std()
            .is_ok_and(|elapsed| elapsed <= self.window);
        if !within_window {
            return Ok(false);
        }

        let delta = (current.speed - previous.speed).abs();
        if delta > self.delta_knots {
            return Ok(true);
        }

        if let Some(ratio) = self.ratio {
            let base = previous.speed.max(current.speed);
            if base > 0.0 && delta / base > ratio {
                return Ok(true);
            }
        }

        let implied = estimated_speed_between_points(mmsi, previous, current)?;
        Ok(implied >= self.unrealistic_speed_knots)
    }

    pub fn message(vessel: &VesselState) -> String {
        format!(
            "{} unusual speed pattern, reported {:.1} knots",
            vessel.display_name(),
            vessel.speed_over_ground
        )
    }
}

/// Speed in knots needed to travel between the two reported positions.
pub fn estimated_speed_between_points(
    mmsi: Mmsi,
    first: &SpeedItem,
    second: &SpeedItem,
) -> Result<f64> {
    let distance = distance_nautical_miles(&first.position, &second.position);
    let hours = (second.timestamp - first.timestamp).num_milliseconds() as f64 / 3_600_000.0;

    let speed = distance / hours;
    if !speed.is_finite() || speed < 0.0 {
        return SpeedEstimationSnafu {
            mmsi,
            from: first.position,
            to: second.position,
            speed,
        }
        .fail();
    }

    Ok(speed)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration as ChronoDuration, TimeZone};
    use fleet_core::PositionReport;

    use super::*;

    fn vessel(speed: f64, secs: i64) -> VesselState {
        let mut report = PositionReport::test_default(Mmsi::test_new(456789123));
        report.speed_over_ground = speed;
        report.timestamp = Utc.timestamp_opt(1_000_000 + secs, 0).unwrap();
        VesselState::from_report(&report)
    }

    #[test]
    fn test_first_report_is_never_anomalous() {
        let mut history = SpeedHistory::default();
        assert!(
            !SpeedAnomaly::default()
                .is_active(&vessel(30.0, 0), &mut history)
                .unwrap()
        );
    }

    #[test]
    fn test_speed_jump_within_window_is_anomalous() {
        let rule = SpeedAnomaly::default();
        let mut history = SpeedHistory::default();
        rule.is_active(&vessel(8.3, 0), &mut history).unwrap();

        assert!(rule.is_active(&vessel(25.0, 10), &mut history).unwrap());
    }

    #[test]
    fn test_speed_jump_outside_window_is_ignored() {
        let rule = SpeedAnomaly::default();
        let mut history = SpeedHistory::default();
        rule.is_active(&vessel(8.3, 0), &mut history).unwrap();

        assert!(!rule.is_active(&vessel(25.0, 3600), &mut history).unwrap());
    }

    #[test]
    fn test_verdict_is_kept_until_next_report() {
        let rule = SpeedAnomaly::default();
        let mut history = SpeedHistory::default();
        rule.is_active(&vessel(8.3, 0), &mut history).unwrap();

        let mut jumped = vessel(25.0, 10);
        assert!(rule.is_active(&jumped, &mut history).unwrap());

        // A tick only moves the estimate
        jumped.last_estimate_at += ChronoDuration::seconds(2);
        assert!(rule.is_active(&jumped, &mut history).unwrap());

        assert!(!rule.is_active(&vessel(24.0, 20), &mut history).unwrap());
    }

    #[test]
    fn test_ratio_catches_small_absolute_changes() {
        let rule = SpeedAnomaly {
            ratio: Some(0.5),
            ..Default::default()
        };
        let mut history = SpeedHistory::default();
        rule.is_active(&vessel(2.0, 0), &mut history).unwrap();

        assert!(rule.is_active(&vessel(8.0, 10), &mut history).unwrap());
    }

    #[test]
    fn test_teleporting_position_is_anomalous() {
        let rule = SpeedAnomaly::default();
        let mut history = SpeedHistory::default();
        rule.is_active(&vessel(12.5, 0), &mut history).unwrap();

        let mut far = vessel(12.5, 60);
        far.reported_position.latitude += 1.0;
        far.position = far.reported_position;

        assert!(rule.is_active(&far, &mut history).unwrap());
    }

    #[test]
    fn test_estimated_speed_between_points_is_correct() {
        let first = SpeedItem {
            position: Position::new(0.0, 0.0),
            speed: 0.0,
            timestamp: Utc.timestamp_opt(1_000_000, 0).unwrap(),
        };
        let second = SpeedItem {
            position: Position::new(0.1, 0.0),
            speed: 0.0,
            timestamp: first.timestamp + ChronoDuration::hours(1),
        };

        let speed = estimated_speed_between_points(Mmsi::test_new(1), &first, &second).unwrap();
        assert!((speed - 6.0).abs() < 0.01, "{speed}");
    }

    #[test]
    fn test_estimated_speed_without_elapsed_time_fails() {
        let first = SpeedItem {
            position: Position::new(0.0, 0.0),
            speed: 0.0,
            timestamp: Utc.timestamp_opt(1_000_000, 0).unwrap(),
        };
        let mut second = first.clone();
        second.position.latitude = 1.0;

        assert!(estimated_speed_between_points(Mmsi::test_new(1), &first, &second).is_err());
    }
}
