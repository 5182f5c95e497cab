use std::collections::HashMap;

use chrono::{DateTime, Utc};
use fleet_core::{Alert, AlertId, AlertKind, DedupeKey, Mmsi, core_error::AlertNotFoundSnafu};
use snafu::ResultExt;
use tokio::sync::Mutex;

use crate::{Result, error::error::CoreSnafu};

#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub mmsi: Option<Mmsi>,
    pub kind: Option<AlertKind>,
    pub open_only: bool,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

#[derive(Default)]
struct Inner {
    next_id: AlertId,
    // Append only, in insertion order
    history: Vec<Alert>,
    open: HashMap<DedupeKey, AlertId>,
}

/// Retains every raised alert and the set of currently open dedupe keys.
///
/// Raise and clear run under a single lock, so the open-key check and the insert are atomic.
#[derive(Default)]
pub struct AlertLedger {
    inner: Mutex<Inner>,
}

impl AlertLedger {
    pub fn new() -> AlertLedger {
        AlertLedger::default()
    }

    /// Returns `None` when an alert for the same vessel and kind is already open.
    pub async fn raise(
        &self,
        mmsi: Mmsi,
        kind: AlertKind,
        message: String,
        now: DateTime<Utc>,
    ) -> Option<Alert> {
        let mut inner = self.inner.lock().await;
        let key = DedupeKey::new(mmsi, kind);

        if inner.open.contains_key(&key) {
            return None;
        }

        let id = inner.next_id;
        inner.next_id = id.next();

        let alert = Alert {
            id,
            mmsi,
            kind,
            message,
            raised_at: now,
        };
        inner.open.insert(key, id);
        inner.history.push(alert.clone());

        Some(alert)
    }

    /// Makes the key available for a new alert, historical alerts are kept.
    /// Returns whether an alert was open for the key.
    pub async fn clear(&self, mmsi: Mmsi, kind: AlertKind) -> bool {
        self.inner
            .lock()
            .await
            .open
            .remove(&DedupeKey::new(mmsi, kind))
            .is_some()
    }

    /// Alerts matching `filter`, newest first with ties broken by the highest id.
    pub async fn list(&self, filter: &AlertFilter) -> Vec<Alert> {
        let inner = self.inner.lock().await;

        let mut alerts: Vec<Alert> = inner
            .history
            .iter()
            .filter(|a| filter.mmsi.is_none_or(|m| a.mmsi == m))
            .filter(|a| filter.kind.is_none_or(|k| a.kind == k))
            .filter(|a| filter.since.is_none_or(|s| a.raised_at >= s))
            .filter(|a| !filter.open_only || inner.open.get(&a.dedupe_key()) == Some(&a.id))
            .cloned()
            .collect();
        drop(inner);

        alerts.sort_by(|a, b| b.raised_at.cmp(&a.raised_at).then(b.id.cmp(&a.id)));

        if let Some(limit) = filter.limit {
            alerts.truncate(limit);
        }

        alerts
    }

    pub async fn open_alerts(&self) -> Vec<Alert> {
        self.list(&AlertFilter {
            open_only: true,
            ..Default::default()
        })
        .await
    }

    pub async fn get(&self, id: AlertId) -> Result<Alert> {
        let inner = self.inner.lock().await;
        match inner.history.iter().find(|a| a.id == id) {
            Some(alert) => Ok(alert.clone()),
            None => AlertNotFoundSnafu { id }.fail().context(CoreSnafu),
        }
    }

    /// Drops cleared alerts raised before `cutoff`, open alerts are always retained.
    /// Returns the number of removed alerts.
    pub async fn prune_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut inner = self.inner.lock().await;
        let Inner { history, open, .. } = &mut *inner;

        let before = history.len();
        history.retain(|a| a.raised_at >= cutoff || open.get(&a.dedupe_key()) == Some(&a.id));
        before - history.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.history.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.history.is_empty()
    }
}
