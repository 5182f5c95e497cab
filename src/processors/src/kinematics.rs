//! Dead reckoning of vessel positions between reports.
//!
//! The extrapolation is planar: the travelled distance in nautical miles is split into a latitude
//! and a longitude component using the course over ground and added to the current estimate as
//! degrees. There is no unit conversion, great-circle or meridian convergence correction, so the
//! result is a rough display approximation and must not be used for navigation.

use chrono::{DateTime, Utc};
use fleet_core::{Position, VesselState, is_bearing};
use geo::{Distance, Haversine, Point};

pub static METERS_PER_NAUTICAL_MILE: f64 = 1852.0;

/// Estimated position of `vessel` at `now`, extrapolated from its current estimate.
///
/// Panics if the vessel carries an out of range course or heading, the store validates every
/// report so such a state can only be the result of a bug.
pub fn advance(vessel: &VesselState, now: DateTime<Utc>) -> Position {
    assert!(
        is_bearing(vessel.course_over_ground) && is_bearing(vessel.heading),
        "vessel '{}' has an invalid course '{}' or heading '{}'",
        vessel.mmsi,
        vessel.course_over_ground,
        vessel.heading,
    );

    if !vessel.is_moving() {
        return vessel.position;
    }

    let elapsed = (now - vessel.last_estimate_at).num_milliseconds().max(0) as f64 / 1000.0;
    let distance = vessel.speed_over_ground * elapsed / 3600.0;
    let course = vessel.course_over_ground.to_radians();

    Position::new(
        (vessel.position.latitude + distance * course.cos()).clamp(-90.0, 90.0),
        wrap_longitude(vessel.position.longitude + distance * course.sin()),
    )
}

/// Great-circle distance in nautical miles between the current estimate and the last report.
pub fn distance_from_report(vessel: &VesselState) -> f64 {
    distance_nautical_miles(&vessel.reported_position, &vessel.position)
}

pub fn distance_nautical_miles(from: &Position, to: &Position) -> f64 {
    let from = Point::new(from.longitude, from.latitude);
    let to = Point::new(to.longitude, to.latitude);
    Haversine.distance(from, to) / METERS_PER_NAUTICAL_MILE
}

fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        longitude
    } else {
        (longitude + 180.0).rem_euclid(360.0) - 180.0
    }
}
