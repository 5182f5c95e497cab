use std::time::Duration;

use chrono::{DateTime, Utc};
use fleet_core::VesselState;

/// Active while a vessel has been anchored or moored for at least the threshold.
#[derive(Debug, Clone)]
pub struct AnchoredTooLong {
    pub threshold: Duration,
}

impl Default for AnchoredTooLong {
    fn default() -> Self {
        AnchoredTooLong {
            threshold: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl AnchoredTooLong {
    pub fn is_active(&self, vessel: &VesselState, now: DateTime<Utc>) -> bool {
        if !vessel.status.is_anchored() {
            return false;
        }

        vessel
            .anchored_since
            .and_then(|since| (now - since).to_std().ok())
            .is_some_and(|anchored_for| anchored_for >= self.threshold)
    }

    pub fn message(&self, vessel: &VesselState) -> String {
        format!(
            "{} anchored for more than {}",
            vessel.display_name(),
            format_threshold(self.threshold)
        )
    }
}

fn format_threshold(threshold: Duration) -> String {
    let secs = threshold.as_secs();
    match (secs % 3600, secs % 60) {
        (0, _) if secs > 0 => format!("{}h", secs / 3600),
        (_, 0) if secs > 0 => format!("{}m", secs / 60),
        _ => format!("{secs}s"),
    }
}
