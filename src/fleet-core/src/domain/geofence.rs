use geo::{Coord, Intersects, LineString, Point, Polygon};
use serde::{Deserialize, Serialize};

use crate::{CoreResult, Position, core_error::InvalidGeofenceSnafu};

/// Geofence as it appears in configuration, vertices are `[latitude, longitude]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceDefinition {
    pub id: String,
    pub name: String,
    pub polygon: Vec<[f64; 2]>,
}

/// A polygonal region whose entry and exit by a vessel is monitored.
#[derive(Debug, Clone, PartialEq)]
pub struct Geofence {
    id: String,
    name: String,
    polygon: Polygon<f64>,
}

impl Geofence {
    /// The polygon is closed implicitly, the first vertex should not be repeated.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        vertices: &[Position],
    ) -> CoreResult<Self> {
        let id = id.into();

        if vertices.len() < 3 {
            return InvalidGeofenceSnafu {
                id,
                reason: format!("polygon needs at least 3 vertices, got {}", vertices.len()),
            }
            .fail();
        }

        if let Some(v) = vertices.iter().find(|v| {
            !(-90.0..=90.0).contains(&v.latitude) || !(-180.0..=180.0).contains(&v.longitude)
        }) {
            return InvalidGeofenceSnafu {
                id,
                reason: format!("vertex ({}, {}) is out of range", v.latitude, v.longitude),
            }
            .fail();
        }

        let exterior: LineString<f64> = vertices
            .iter()
            .map(|v| Coord {
                x: v.longitude,
                y: v.latitude,
            })
            .collect();

        Ok(Self {
            id,
            name: name.into(),
            polygon: Polygon::new(exterior, vec![]),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Points on an edge or a vertex count as inside.
    pub fn contains(&self, position: &Position) -> bool {
        let point = Point::new(position.longitude, position.latitude);
        self.polygon.intersects(&point)
    }
}

impl TryFrom<GeofenceDefinition> for Geofence {
    type Error = crate::Error;

    fn try_from(value: GeofenceDefinition) -> Result<Self, Self::Error> {
        let GeofenceDefinition { id, name, polygon } = value;
        let vertices: Vec<Position> = polygon
            .into_iter()
            .map(|[latitude, longitude]| Position::new(latitude, longitude))
            .collect();
        Geofence::new(id, name, &vertices)
    }
}

#[cfg(any(test, feature = "test"))]
mod test {
    use super::*;

    impl Geofence {
        /// Axis aligned box between the two corners.
        pub fn test_rectangle(id: &str, south_west: Position, north_east: Position) -> Geofence {
            Geofence::new(
                id,
                format!("{id} zone"),
                &[
                    south_west,
                    Position::new(south_west.latitude, north_east.longitude),
                    north_east,
                    Position::new(north_east.latitude, south_west.longitude),
                ],
            )
            .unwrap()
        }
    }
}
