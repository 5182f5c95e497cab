use fleet_core::{Geofence, VesselState};

/// Active while the vessel is inside any of the configured geofences.
#[derive(Debug, Clone, Default)]
pub struct GeofenceBreach {
    geofences: Vec<Geofence>,
}

impl GeofenceBreach {
    pub fn new(geofences: Vec<Geofence>) -> Self {
        Self { geofences }
    }

    /// The first geofence containing the vessel's current position.
    pub fn breached(&self, vessel: &VesselState) -> Option<&Geofence> {
        self.geofences
            .iter()
            .find(|g| g.contains(&vessel.position))
    }

    pub fn message(vessel: &VesselState, geofence: &Geofence) -> String {
        format!(
            "{} entered restricted zone {}",
            vessel.display_name(),
            geofence.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use fleet_core::{Mmsi, Position, PositionReport};

    use super::*;

    #[test]
    fn test_first_containing_geofence_is_reported() {
        let rule = GeofenceBreach::new(vec![
            Geofence::test_rectangle(
                "far",
                Position::new(50.0, 50.0),
                Position::new(51.0, 51.0),
            ),
            Geofence::test_rectangle(
                "near",
                Position::new(25.0, -81.0),
                Position::new(26.0, -80.0),
            ),
        ]);
        let mut report = PositionReport::test_default(Mmsi::test_new(123456789));
        report.name = Some("ATLANTIC PIONEER".into());
        let vessel = VesselState::from_report(&report);

        let fence = rule.breached(&vessel).unwrap();
        assert_eq!(fence.id(), "near");
        assert_eq!(
            GeofenceBreach::message(&vessel, fence),
            "ATLANTIC PIONEER entered restricted zone near zone"
        );
    }

    #[test]
    fn test_no_geofences_never_breach() {
        let vessel = VesselState::from_report(&PositionReport::test_default(Mmsi::test_new(1)));
        assert!(GeofenceBreach::default().breached(&vessel).is_none());
    }
}
