use chrono::{DateTime, Utc};
use fleet_core::{Mmsi, NavigationStatus, PositionReport, VesselInfo, VesselStatus};
use num_traits::FromPrimitive;
use serde::{Deserialize, Serialize};

/// Heading value used by transponders without a gyro compass.
pub const HEADING_NOT_AVAILABLE: i32 = 511;
/// Course value used when the course is not available.
pub const COURSE_NOT_AVAILABLE: f64 = 360.0;

/// Vessel related data that is emitted every 6th minute from vessels.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AisStatic {
    #[serde(rename = "type")]
    pub message_type: Option<AisMessageType>,
    pub mmsi: Mmsi,
    pub msgtime: DateTime<Utc>,
    pub name: Option<String>,
    #[serde(rename = "shipType")]
    pub ship_type: Option<i32>,
}

/// Position data that is emitted every 6th second by vessels.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AisPosition {
    #[serde(rename = "type")]
    pub message_type: Option<AisMessageType>,
    pub mmsi: Mmsi,
    pub msgtime: DateTime<Utc>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(rename = "speedOverGround")]
    pub speed_over_ground: Option<f64>,
    #[serde(rename = "courseOverGround")]
    pub course_over_ground: Option<f64>,
    #[serde(rename = "trueHeading")]
    pub true_heading: Option<i32>,
    #[serde(rename = "navigationalStatus")]
    pub navigational_status: Option<i32>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub enum AisMessageType {
    /// A message containing position data.
    Position,
    /// A message containing vessel related data.
    #[serde(rename = "Staticdata")]
    Static,
}

/// Convenience struct to deserialize the message type prior to attempting to deserialize the full
/// message.
#[derive(Deserialize)]
pub struct MessageType {
    /// What type of message this is.
    #[serde(rename = "type")]
    pub message_type: AisMessageType,
}

#[derive(Debug, Clone)]
pub enum AisMessage {
    Static(AisStatic),
    Position(AisPosition),
}

impl From<AisPosition> for Option<PositionReport> {
    fn from(a: AisPosition) -> Self {
        let AisPosition {
            message_type: _,
            mmsi,
            msgtime,
            latitude,
            longitude,
            speed_over_ground,
            course_over_ground,
            true_heading,
            navigational_status,
        } = a;

        let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
            return None;
        };

        let course_over_ground = course_over_ground
            .filter(|c| *c != COURSE_NOT_AVAILABLE)
            .unwrap_or(0.0);

        let heading = match true_heading {
            Some(HEADING_NOT_AVAILABLE) | None => course_over_ground,
            Some(heading) => heading as f64,
        };

        let status = navigational_status
            .and_then(NavigationStatus::from_i32)
            .map(VesselStatus::from)
            .unwrap_or_default();

        Some(PositionReport {
            mmsi,
            latitude,
            longitude,
            speed_over_ground: speed_over_ground.unwrap_or(0.0),
            course_over_ground,
            heading,
            status,
            timestamp: msgtime,
            name: None,
            ship_type: None,
        })
    }
}

impl From<AisStatic> for VesselInfo {
    fn from(a: AisStatic) -> Self {
        VesselInfo {
            name: a.name.and_then(|n| {
                // AIS pads names with '@'
                let trimmed = n.trim_end_matches('@').trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }),
            ship_type: a.ship_type,
        }
    }
}

#[cfg(feature = "test")]
mod test {
    use chrono::TimeZone;

    use super::*;

    impl AisPosition {
        pub fn test_default(mmsi: Mmsi) -> AisPosition {
            AisPosition {
                message_type: Some(AisMessageType::Position),
                mmsi,
                msgtime: Utc.timestamp_opt(1_000_000, 0).unwrap(),
                latitude: Some(25.7617),
                longitude: Some(-80.1918),
                speed_over_ground: Some(12.5),
                course_over_ground: Some(45.0),
                true_heading: Some(47),
                navigational_status: Some(NavigationStatus::UnderWayUsingEngine as i32),
            }
        }
    }

    impl AisStatic {
        pub fn test_default(mmsi: Mmsi) -> AisStatic {
            AisStatic {
                message_type: Some(AisMessageType::Static),
                mmsi,
                msgtime: Utc.timestamp_opt(1_000_000, 0).unwrap(),
                name: Some("ATLANTIC PIONEER".to_string()),
                ship_type: Some(80),
            }
        }
    }
}
