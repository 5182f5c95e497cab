use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    CoreResult, Mmsi, Position, VesselInfo, VesselStatus, core_error::InvalidReportSnafu,
};

/// A single position report, the only input that moves a vessel to a known position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionReport {
    pub mmsi: Mmsi,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_over_ground: f64,
    pub course_over_ground: f64,
    pub heading: f64,
    pub status: VesselStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ship_type: Option<i32>,
}

impl PositionReport {
    pub fn position(&self) -> Position {
        Position::new(self.latitude, self.longitude)
    }

    pub fn info(&self) -> VesselInfo {
        VesselInfo {
            name: self.name.clone(),
            ship_type: self.ship_type,
        }
    }

    /// Checks every numeric field against its valid range.
    pub fn validate(&self) -> CoreResult<()> {
        check(self.mmsi, "latitude", self.latitude, |v| {
            (-90.0..=90.0).contains(&v)
        })?;
        check(self.mmsi, "longitude", self.longitude, |v| {
            (-180.0..=180.0).contains(&v)
        })?;
        check(self.mmsi, "speed_over_ground", self.speed_over_ground, |v| {
            v.is_finite() && v >= 0.0
        })?;
        check(self.mmsi, "course_over_ground", self.course_over_ground, is_bearing)?;
        check(self.mmsi, "heading", self.heading, is_bearing)?;
        Ok(())
    }
}

/// Whether `value` is a bearing in degrees within [0, 360).
pub fn is_bearing(value: f64) -> bool {
    (0.0..360.0).contains(&value)
}

fn check(
    mmsi: Mmsi,
    field: &'static str,
    value: f64,
    valid: impl Fn(f64) -> bool,
) -> CoreResult<()> {
    if valid(value) {
        Ok(())
    } else {
        InvalidReportSnafu { mmsi, field, value }.fail()
    }
}

#[cfg(any(test, feature = "test"))]
mod test {
    use chrono::TimeZone;

    use super::*;

    impl PositionReport {
        pub fn test_default(mmsi: Mmsi) -> PositionReport {
            PositionReport {
                mmsi,
                latitude: 25.7617,
                longitude: -80.1918,
                speed_over_ground: 12.5,
                course_over_ground: 45.0,
                heading: 47.0,
                status: VesselStatus::UnderWay,
                timestamp: Utc.timestamp_opt(1_000_000, 0).unwrap(),
                name: None,
                ship_type: None,
            }
        }
    }
}
