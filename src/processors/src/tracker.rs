use std::time::Duration;

use chrono::{DateTime, Utc};
use fleet_core::{
    Alert, AlertId, FleetEvent, FleetSnapshot, Geofence, Mmsi, PositionReport, VesselInfo,
    VesselState,
};
use snafu::ResultExt;
use tokio::sync::broadcast;
use tracing::{Level, error, event, info, instrument};

use crate::{
    AlertFilter, AlertLedger, ConnectionController, Result, RuleEvaluator, RuleTransition,
    TrackerSettings, VesselStore, error::error::CoreSnafu,
};

/// Wires the store, the rules and the ledger together.
///
/// Reports enter through [`Tracker::apply_report`], time advances through [`Tracker::tick`].
/// Alert changes and tick snapshots are pushed to a bounded broadcast channel where slow
/// subscribers lag instead of blocking the tracker.
pub struct Tracker {
    store: VesselStore,
    rules: RuleEvaluator,
    ledger: AlertLedger,
    connection: ConnectionController,
    events: broadcast::Sender<FleetEvent>,
    stale_vessel_max_age: Duration,
    alert_retention: Option<Duration>,
}

impl Tracker {
    pub fn new(settings: &TrackerSettings, connection: ConnectionController) -> Result<Tracker> {
        let geofences = settings
            .geofences
            .iter()
            .cloned()
            .map(Geofence::try_from)
            .collect::<std::result::Result<Vec<_>, _>>()
            .context(CoreSnafu)?;

        let (events, _) = broadcast::channel(settings.broadcast_buffer_size.max(1));

        info!(geofences = geofences.len(), "tracker configured");

        Ok(Tracker {
            store: VesselStore::new(),
            rules: RuleEvaluator::from_settings(settings, geofences),
            ledger: AlertLedger::new(),
            connection,
            events,
            stale_vessel_max_age: settings.stale_vessel_max_age,
            alert_retention: settings.alert_retention,
        })
    }

    /// Single ingestion entry point. Invalid reports are returned as errors and leave all state
    /// untouched.
    #[instrument(skip_all, fields(mmsi = %report.mmsi))]
    pub async fn apply_report(&self, report: &PositionReport) -> Result<VesselState> {
        let vessel = self.store.apply_report(report).await?;
        self.connection.record_update(report.timestamp);

        if let Err(e) = self.evaluate(&vessel, vessel.last_estimate_at).await {
            error!("failed to evaluate rules: {e:?}");
        }

        Ok(vessel)
    }

    pub async fn apply_static(
        &self,
        mmsi: Mmsi,
        info: VesselInfo,
        received_at: DateTime<Utc>,
    ) -> Option<VesselState> {
        self.store.apply_static(mmsi, info, received_at).await
    }

    /// Evicts stale vessels, dead reckons the rest to `now` and re-evaluates every vessel.
    /// A failing vessel is logged and skipped. The resulting snapshot is broadcast and returned.
    #[instrument(skip(self), fields(app.num_vessels))]
    pub async fn tick(&self, now: DateTime<Utc>) -> FleetSnapshot {
        self.evict_stale(now).await;

        let vessels = self.store.advance_all(now).await;
        tracing::Span::current().record("app.num_vessels", vessels.len());

        for vessel in &vessels {
            if let Err(e) = self.evaluate(vessel, vessel.last_estimate_at).await {
                error!(mmsi = %vessel.mmsi, "failed to evaluate rules: {e:?}");
            }
        }

        if let Some(retention) = self.alert_retention {
            self.prune_alerts(now, retention).await;
        }

        let snapshot = self.snapshot(now).await;
        self.publish(FleetEvent::Snapshot(Box::new(snapshot.clone())));
        snapshot
    }

    pub async fn snapshot(&self, now: DateTime<Utc>) -> FleetSnapshot {
        let vessels = self.store.all().await;
        let status = self.connection.status();

        FleetSnapshot {
            summary: fleet_core::FleetSummary::from_vessels(&vessels),
            vessels,
            alerts: self.ledger.open_alerts().await,
            connection_state: status.state,
            last_update_at: status.last_update_at,
            generated_at: now,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FleetEvent> {
        self.events.subscribe()
    }

    pub async fn vessel(&self, mmsi: Mmsi) -> Result<VesselState> {
        self.store.get(mmsi).await
    }

    pub async fn vessels(&self) -> Vec<VesselState> {
        self.store.all().await
    }

    pub async fn alerts(&self, filter: &AlertFilter) -> Vec<Alert> {
        self.ledger.list(filter).await
    }

    pub async fn alert(&self, id: AlertId) -> Result<Alert> {
        self.ledger.get(id).await
    }

    pub fn connection(&self) -> &ConnectionController {
        &self.connection
    }

    async fn evaluate(&self, vessel: &VesselState, now: DateTime<Utc>) -> Result<()> {
        let transitions = self.rules.evaluate(vessel, now).await?;

        for transition in transitions {
            match transition {
                RuleTransition::Raise { kind, message } => {
                    if let Some(alert) = self.ledger.raise(vessel.mmsi, kind, message, now).await {
                        event!(
                            Level::INFO,
                            id = %alert.id,
                            mmsi = %alert.mmsi,
                            %kind,
                            "alert raised"
                        );
                        self.publish(FleetEvent::AlertRaised(alert));
                    }
                }
                RuleTransition::Clear { kind } => self.clear(vessel.mmsi, kind).await,
            }
        }

        Ok(())
    }

    async fn clear(&self, mmsi: Mmsi, kind: fleet_core::AlertKind) {
        if self.ledger.clear(mmsi, kind).await {
            event!(Level::INFO, %mmsi, %kind, "alert cleared");
            self.publish(FleetEvent::AlertCleared { mmsi, kind });
        }
    }

    async fn evict_stale(&self, now: DateTime<Utc>) {
        let evicted = self.store.evict_stale(now, self.stale_vessel_max_age).await;
        if evicted.is_empty() {
            return;
        }

        info!(num_vessels = evicted.len(), "evicted stale vessels");

        for mmsi in evicted {
            for kind in self.rules.forget(mmsi).await {
                self.clear(mmsi, kind).await;
            }
        }
    }

    async fn prune_alerts(&self, now: DateTime<Utc>, retention: Duration) {
        let Some(cutoff) = chrono::Duration::from_std(retention)
            .ok()
            .and_then(|r| now.checked_sub_signed(r))
        else {
            return;
        };

        let removed = self.ledger.prune_before(cutoff).await;
        if removed > 0 {
            info!(removed, "pruned cleared alerts");
        }
    }

    fn publish(&self, event: FleetEvent) {
        // Only fails without subscribers
        let _ = self.events.send(event);
    }
}
