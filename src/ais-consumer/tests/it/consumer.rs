use ais_consumer::models::{AisPosition, AisStatic};
use fleet_core::{AlertKind, ConnectionState, Mmsi, VesselStatus};
use processors::AlertFilter;

use crate::helper::test;

#[tokio::test(flavor = "multi_thread")]
async fn test_position_message_creates_vessel() {
    test(|mut helper| async move {
        let pos = AisPosition::test_default(Mmsi::test_new(123456789));
        helper.ais_source.send_position(&pos).await;
        helper.processed().await;

        let vessel = helper.tracker.vessel(pos.mmsi).await.unwrap();
        assert_eq!(vessel.position.latitude, 25.7617);
        assert_eq!(vessel.position.longitude, -80.1918);
        assert_eq!(vessel.speed_over_ground, 12.5);
        assert_eq!(vessel.course_over_ground, 45.0);
        assert_eq!(vessel.heading, 47.0);
        assert_eq!(vessel.status, VesselStatus::UnderWay);
        assert_eq!(vessel.last_report_at, pos.msgtime);
        assert_eq!(vessel.last_estimate_at, pos.msgtime);
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_static_data_received_before_position_names_vessel() {
    test(|mut helper| async move {
        let mmsi = Mmsi::test_new(1);
        helper
            .ais_source
            .send_static(&AisStatic::test_default(mmsi))
            .await;
        helper.processed().await;
        assert!(helper.tracker.vessel(mmsi).await.unwrap_err().is_not_found());

        helper
            .ais_source
            .send_position(&AisPosition::test_default(mmsi))
            .await;
        helper.processed().await;

        let vessel = helper.tracker.vessel(mmsi).await.unwrap();
        assert_eq!(vessel.info.name.as_deref(), Some("ATLANTIC PIONEER"));
        assert_eq!(vessel.info.ship_type, Some(80));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_existing_static_fields_are_not_replaced_by_null_values() {
    test(|mut helper| async move {
        let mmsi = Mmsi::test_new(2);
        helper
            .ais_source
            .send_position(&AisPosition::test_default(mmsi))
            .await;
        helper.processed().await;

        let vessel = AisStatic::test_default(mmsi);
        let mut update = vessel.clone();
        update.name = None;
        update.ship_type = Some(70);

        helper.ais_source.send_static(&vessel).await;
        helper.processed().await;
        helper.ais_source.send_static(&update).await;
        helper.processed().await;

        let vessel = helper.tracker.vessel(mmsi).await.unwrap();
        assert_eq!(vessel.info.name.as_deref(), Some("ATLANTIC PIONEER"));
        assert_eq!(vessel.info.ship_type, Some(70));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_position_without_coordinates_is_dropped() {
    test(|mut helper| async move {
        let mut pos = AisPosition::test_default(Mmsi::test_new(3));
        pos.latitude = None;

        helper.ais_source.send_position(&pos).await;
        helper.processed().await;

        assert!(helper.tracker.vessels().await.is_empty());
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_lines_do_not_stop_consumption() {
    test(|mut helper| async move {
        helper.ais_source.send_string("not json".into()).await;
        helper.processed().await;

        let pos = AisPosition::test_default(Mmsi::test_new(4));
        helper.ais_source.send_position(&pos).await;
        helper.processed().await;

        assert!(helper.tracker.vessel(pos.mmsi).await.is_ok());
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_out_of_range_position_is_rejected() {
    test(|mut helper| async move {
        let mut pos = AisPosition::test_default(Mmsi::test_new(5));
        pos.latitude = Some(95.0);

        helper.ais_source.send_position(&pos).await;
        helper.processed().await;

        assert!(helper.tracker.vessels().await.is_empty());
        assert!(
            helper
                .tracker
                .connection()
                .status()
                .last_update_at
                .is_none()
        );
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_anchored_navigation_status_sets_anchored_since() {
    test(|mut helper| async move {
        let mut pos = AisPosition::test_default(Mmsi::test_new(6));
        pos.navigational_status = Some(1);
        pos.speed_over_ground = Some(0.0);

        helper.ais_source.send_position(&pos).await;
        helper.processed().await;

        let vessel = helper.tracker.vessel(pos.mmsi).await.unwrap();
        assert_eq!(vessel.status, VesselStatus::Anchored);
        assert_eq!(vessel.anchored_since, Some(pos.msgtime));
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_entering_geofence_raises_one_alert() {
    test(|mut helper| async move {
        let mmsi = Mmsi::test_new(123456789);
        let mut pos = AisPosition::test_default(mmsi);
        pos.latitude = Some(26.5);
        pos.longitude = Some(-79.5);
        pos.speed_over_ground = Some(0.0);

        helper.ais_source.send_position(&pos).await;
        helper.processed().await;

        pos.msgtime += chrono::Duration::hours(1);
        pos.latitude = Some(26.6);
        helper.ais_source.send_position(&pos).await;
        helper.processed().await;

        let alerts = helper
            .tracker
            .alerts(&AlertFilter {
                mmsi: Some(mmsi),
                open_only: true,
                ..Default::default()
            })
            .await;

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::GeofenceBreach);
        assert_eq!(
            alerts[0].message,
            "MMSI 123456789 entered restricted zone Harbour"
        );
    })
    .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_processed_reports_update_connection_status() {
    test(|mut helper| async move {
        let pos = AisPosition::test_default(Mmsi::test_new(7));
        helper.ais_source.send_position(&pos).await;
        helper.processed().await;

        let status = helper.tracker.connection().status();
        assert_eq!(status.state, ConnectionState::Connected);
        assert_eq!(status.last_update_at, Some(pos.msgtime));
    })
    .await;
}
