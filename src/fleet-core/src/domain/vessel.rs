use std::{fmt::Display, num::ParseIntError, str::FromStr};

use chrono::{DateTime, Utc};
use num_derive::FromPrimitive;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use strum::{AsRefStr, EnumString};

use crate::PositionReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Mmsi(i32);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// The closed set of statuses the tracker reasons about.
#[derive(
    Debug,
    Default,
    Copy,
    Clone,
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
pub enum VesselStatus {
    #[serde(rename = "UNDERWAY")]
    #[strum(serialize = "UNDERWAY")]
    UnderWay,
    Anchored,
    Moored,
    Aground,
    #[default]
    Unknown,
}

/// Navigational status as transmitted in AIS position messages.
#[derive(
    Debug,
    Copy,
    Clone,
    PartialEq,
    Eq,
    FromPrimitive,
    Serialize_repr,
    Deserialize_repr,
    strum::Display,
    AsRefStr,
    EnumString,
)]
#[repr(i32)]
pub enum NavigationStatus {
    UnderWayUsingEngine = 0,
    AtAnchor = 1,
    NotUnderCommand = 2,
    RestrictedManoeuverability = 3,
    ConstrainedByDraught = 4,
    Moored = 5,
    Aground = 6,
    EngagedInFishing = 7,
    UnderWaySailing = 8,
    Reserved9 = 9,
    Reserved10 = 10,
    Reserved11 = 11,
    Reserved12 = 12,
    Reserved13 = 13,
    AisSartIsActive = 14,
    NotDefined = 15,
}

/// Static vessel data, received from AIS static messages or alongside a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselInfo {
    pub name: Option<String>,
    pub ship_type: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselState {
    pub mmsi: Mmsi,
    pub position: Position,
    pub reported_position: Position,
    pub speed_over_ground: f64,
    pub course_over_ground: f64,
    pub heading: f64,
    pub status: VesselStatus,
    pub last_report_at: DateTime<Utc>,
    pub last_estimate_at: DateTime<Utc>,
    pub anchored_since: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub info: VesselInfo,
    /// Bumped on every mutation of this vessel.
    pub revision: u64,
}

impl Mmsi {
    pub fn into_inner(self) -> i32 {
        self.0
    }
}

impl From<i32> for Mmsi {
    fn from(value: i32) -> Self {
        Self(value)
    }
}

impl From<Mmsi> for i32 {
    fn from(value: Mmsi) -> Self {
        value.0
    }
}

impl FromStr for Mmsi {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

impl Display for Mmsi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl VesselStatus {
    pub fn is_anchored(&self) -> bool {
        match self {
            VesselStatus::Anchored | VesselStatus::Moored => true,
            VesselStatus::UnderWay | VesselStatus::Aground | VesselStatus::Unknown => false,
        }
    }
}

impl From<NavigationStatus> for VesselStatus {
    fn from(value: NavigationStatus) -> Self {
        match value {
            NavigationStatus::UnderWayUsingEngine | NavigationStatus::UnderWaySailing => {
                VesselStatus::UnderWay
            }
            NavigationStatus::AtAnchor => VesselStatus::Anchored,
            NavigationStatus::Moored => VesselStatus::Moored,
            NavigationStatus::Aground => VesselStatus::Aground,
            NavigationStatus::NotUnderCommand
            | NavigationStatus::RestrictedManoeuverability
            | NavigationStatus::ConstrainedByDraught
            | NavigationStatus::EngagedInFishing
            | NavigationStatus::Reserved9
            | NavigationStatus::Reserved10
            | NavigationStatus::Reserved11
            | NavigationStatus::Reserved12
            | NavigationStatus::Reserved13
            | NavigationStatus::AisSartIsActive
            | NavigationStatus::NotDefined => VesselStatus::Unknown,
        }
    }
}

impl VesselInfo {
    /// Fills in the fields present in `other`, existing values are never replaced by missing
    /// ones.
    pub fn merge(&mut self, other: VesselInfo) {
        let VesselInfo { name, ship_type } = other;
        if name.is_some() {
            self.name = name;
        }
        if ship_type.is_some() {
            self.ship_type = ship_type;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.ship_type.is_none()
    }
}

impl VesselState {
    /// Creates the state of a vessel we have never seen before.
    /// The report is assumed to be validated.
    pub fn from_report(report: &PositionReport) -> Self {
        let position = report.position();
        Self {
            mmsi: report.mmsi,
            position,
            reported_position: position,
            speed_over_ground: report.speed_over_ground,
            course_over_ground: report.course_over_ground,
            heading: report.heading,
            status: report.status,
            last_report_at: report.timestamp,
            last_estimate_at: report.timestamp,
            anchored_since: report.status.is_anchored().then_some(report.timestamp),
            info: report.info(),
            revision: 0,
        }
    }

    /// Replaces the kinematic state with the reported values, dropping any extrapolation.
    /// The report is assumed to be validated.
    pub fn apply_report(&mut self, report: &PositionReport) {
        self.anchored_since = match (self.status.is_anchored(), report.status.is_anchored()) {
            (false, true) => Some(report.timestamp),
            (true, true) => self.anchored_since.or(Some(report.timestamp)),
            (_, false) => None,
        };

        let position = report.position();
        self.position = position;
        self.reported_position = position;
        self.speed_over_ground = report.speed_over_ground;
        self.course_over_ground = report.course_over_ground;
        self.heading = report.heading;
        self.status = report.status;
        self.last_report_at = report.timestamp;
        self.last_estimate_at = report.timestamp;
        self.info.merge(report.info());
        self.revision += 1;
    }

    pub fn is_moving(&self) -> bool {
        self.speed_over_ground > 0.0
    }

    /// Name used in alert messages, falls back to the MMSI for vessels without static data.
    pub fn display_name(&self) -> String {
        match &self.info.name {
            Some(name) => name.clone(),
            None => format!("MMSI {}", self.mmsi),
        }
    }
}

#[cfg(any(test, feature = "test"))]
mod test {
    use super::*;

    impl Mmsi {
        pub fn test_new(mmsi: i32) -> Self {
            Self(mmsi)
        }
    }
}
