use std::time::Duration;

use fleet_core::GeofenceDefinition;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerSettings {
    #[serde(with = "humantime_serde", default = "default_tick_interval")]
    pub tick_interval: Duration,
    #[serde(with = "humantime_serde", default = "default_anchored_too_long_threshold")]
    pub anchored_too_long_threshold: Duration,
    #[serde(default = "default_speed_anomaly_delta_knots")]
    pub speed_anomaly_delta_knots: f64,
    /// Relative speed change, against the larger of the two speeds, that counts as an anomaly.
    #[serde(default)]
    pub speed_anomaly_ratio: Option<f64>,
    #[serde(with = "humantime_serde", default = "default_speed_anomaly_window")]
    pub speed_anomaly_window: Duration,
    #[serde(default = "default_unrealistic_speed_knots")]
    pub unrealistic_speed_knots: f64,
    #[serde(with = "humantime_serde", default = "default_stale_vessel_max_age")]
    pub stale_vessel_max_age: Duration,
    /// Cleared alerts older than this are dropped from the ledger, kept forever if unset.
    #[serde(with = "humantime_serde", default)]
    pub alert_retention: Option<Duration>,
    #[serde(default = "default_broadcast_buffer_size")]
    pub broadcast_buffer_size: usize,
    #[serde(default)]
    pub geofences: Vec<GeofenceDefinition>,
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_anchored_too_long_threshold() -> Duration {
    Duration::from_secs(24 * 60 * 60)
}

fn default_speed_anomaly_delta_knots() -> f64 {
    10.0
}

fn default_speed_anomaly_window() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_unrealistic_speed_knots() -> f64 {
    70.0
}

fn default_stale_vessel_max_age() -> Duration {
    Duration::from_secs(60 * 60)
}

fn default_broadcast_buffer_size() -> usize {
    64
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            tick_interval: default_tick_interval(),
            anchored_too_long_threshold: default_anchored_too_long_threshold(),
            speed_anomaly_delta_knots: default_speed_anomaly_delta_knots(),
            speed_anomaly_ratio: None,
            speed_anomaly_window: default_speed_anomaly_window(),
            unrealistic_speed_knots: default_unrealistic_speed_knots(),
            stale_vessel_max_age: default_stale_vessel_max_age(),
            alert_retention: None,
            broadcast_buffer_size: default_broadcast_buffer_size(),
            geofences: vec![],
        }
    }
}
