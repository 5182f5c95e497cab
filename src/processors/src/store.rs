use std::{
    collections::{HashMap, hash_map::Entry},
    sync::Arc,
};

use chrono::{DateTime, Duration, Utc};
use fleet_core::{Mmsi, PositionReport, VesselInfo, VesselState, core_error::VesselNotFoundSnafu};
use snafu::ResultExt;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::{Result, error::error::CoreSnafu, kinematics};

type VesselEntry = Arc<Mutex<VesselState>>;

/// Static data received before the first position report of a vessel.
#[derive(Debug)]
struct PendingInfo {
    info: VesselInfo,
    received_at: DateTime<Utc>,
}

/// Authoritative state of every tracked vessel.
///
/// The map lock is held while a vessel is updated, shared for updates of known vessels and
/// exclusive for inserts and evictions. All mutation of a vessel happens under its own lock.
/// Readers clone a vessel while holding its lock and therefore never see a partially applied
/// update.
#[derive(Default)]
pub struct VesselStore {
    vessels: RwLock<HashMap<Mmsi, VesselEntry>>,
    pending_info: Mutex<HashMap<Mmsi, PendingInfo>>,
}

impl VesselStore {
    pub fn new() -> VesselStore {
        VesselStore::default()
    }

    /// Validates and applies `report`, creating the vessel if it has not been seen before.
    /// Invalid reports leave the store untouched.
    pub async fn apply_report(&self, report: &PositionReport) -> Result<VesselState> {
        report.validate().context(CoreSnafu)?;

        {
            // Eviction needs the write lock, so the entry stays in the map until the update is done
            let vessels = self.vessels.read().await;
            if let Some(vessel) = vessels.get(&report.mmsi) {
                return Ok(apply(vessel, report).await);
            }
        }

        let mut vessels = self.vessels.write().await;
        match vessels.entry(report.mmsi) {
            // Another task inserted the vessel while we waited for the write lock
            Entry::Occupied(e) => Ok(apply(e.get(), report).await),
            Entry::Vacant(e) => {
                let mut state = VesselState::from_report(report);
                if let Some(pending) = self.pending_info.lock().await.remove(&report.mmsi) {
                    let mut info = pending.info;
                    info.merge(state.info);
                    state.info = info;
                }
                debug!(mmsi = %report.mmsi, "tracking new vessel");
                e.insert(Arc::new(Mutex::new(state.clone())));
                Ok(state)
            }
        }
    }

    /// Merges static vessel data. Data for vessels without a position yet is kept until their
    /// first report arrives, or until it is older than the eviction age.
    pub async fn apply_static(
        &self,
        mmsi: Mmsi,
        info: VesselInfo,
        received_at: DateTime<Utc>,
    ) -> Option<VesselState> {
        if info.is_empty() {
            return None;
        }

        // The map lock is held while touching `pending_info` so a concurrent first report cannot
        // slip in between the lookup and the insert below.
        let vessels = self.vessels.read().await;
        match vessels.get(&mmsi) {
            Some(vessel) => {
                let mut state = vessel.lock().await;
                state.info.merge(info);
                state.revision += 1;
                Some(state.clone())
            }
            None => {
                match self.pending_info.lock().await.entry(mmsi) {
                    Entry::Occupied(mut e) => {
                        let pending = e.get_mut();
                        pending.info.merge(info);
                        pending.received_at = pending.received_at.max(received_at);
                    }
                    Entry::Vacant(e) => {
                        e.insert(PendingInfo { info, received_at });
                    }
                }
                None
            }
        }
    }

    pub async fn get(&self, mmsi: Mmsi) -> Result<VesselState> {
        match self.entry(mmsi).await {
            Some(vessel) => Ok(vessel.lock().await.clone()),
            None => VesselNotFoundSnafu { mmsi }.fail().context(CoreSnafu),
        }
    }

    /// All vessels ordered by MMSI.
    pub async fn all(&self) -> Vec<VesselState> {
        let entries = self.entries().await;
        let mut out = Vec::with_capacity(entries.len());
        for vessel in entries {
            out.push(vessel.lock().await.clone());
        }
        out
    }

    pub async fn len(&self) -> usize {
        self.vessels.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.vessels.read().await.is_empty()
    }

    /// Dead reckons every moving vessel to `now` and returns the resulting state of every vessel,
    /// ordered by MMSI. Stationary vessels keep their position but have their estimate time
    /// refreshed.
    pub async fn advance_all(&self, now: DateTime<Utc>) -> Vec<VesselState> {
        let entries = self.entries().await;
        let mut out = Vec::with_capacity(entries.len());
        for vessel in entries {
            let mut state = vessel.lock().await;
            if state.is_moving() {
                state.position = kinematics::advance(&state, now);
            }
            state.last_estimate_at = state.last_estimate_at.max(now);
            state.revision += 1;
            out.push(state.clone());
        }
        out
    }

    /// Removes vessels whose last report is older than `max_age` and returns their MMSIs.
    /// Static data still waiting for a first report is dropped by the same age.
    pub async fn evict_stale(&self, now: DateTime<Utc>, max_age: std::time::Duration) -> Vec<Mmsi> {
        let Some(cutoff) = Duration::from_std(max_age)
            .ok()
            .and_then(|max_age| now.checked_sub_signed(max_age))
        else {
            return vec![];
        };

        let mut vessels = self.vessels.write().await;

        let mut stale = Vec::new();
        for (mmsi, vessel) in vessels.iter() {
            if vessel.lock().await.last_report_at < cutoff {
                stale.push(*mmsi);
            }
        }

        for mmsi in &stale {
            vessels.remove(mmsi);
        }

        let mut pending = self.pending_info.lock().await;
        let num_pending = pending.len();
        pending.retain(|_, p| p.received_at >= cutoff);
        let num_dropped = num_pending - pending.len();
        if num_dropped > 0 {
            debug!(num_dropped, "dropped static data of vessels without reports");
        }

        stale.sort();
        stale
    }

    async fn entry(&self, mmsi: Mmsi) -> Option<VesselEntry> {
        self.vessels.read().await.get(&mmsi).cloned()
    }

    async fn entries(&self) -> Vec<VesselEntry> {
        let vessels = self.vessels.read().await;
        let mut entries: Vec<(Mmsi, VesselEntry)> =
            vessels.iter().map(|(k, v)| (*k, v.clone())).collect();
        drop(vessels);

        entries.sort_by_key(|(mmsi, _)| *mmsi);
        entries.into_iter().map(|(_, v)| v).collect()
    }
}

async fn apply(vessel: &VesselEntry, report: &PositionReport) -> VesselState {
    let mut state = vessel.lock().await;
    state.apply_report(report);
    state.clone()
}
