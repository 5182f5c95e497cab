use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use crate::Tracker;

/// Source of the periodic tick driving dead reckoning and rule evaluation.
#[async_trait]
pub trait Ticker: Send {
    /// Waits for the next tick and returns the time it represents.
    async fn tick(&mut self) -> DateTime<Utc>;
}

/// Wall clock ticker, missed ticks are skipped rather than bursted.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> IntervalTicker {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        IntervalTicker { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> DateTime<Utc> {
        self.interval.tick().await;
        Utc::now()
    }
}

pub struct TickLoop<T> {
    tracker: Arc<Tracker>,
    ticker: T,
}

impl<T: Ticker> TickLoop<T> {
    pub fn new(tracker: Arc<Tracker>, ticker: T) -> TickLoop<T> {
        TickLoop { tracker, ticker }
    }

    /// Ticks the tracker until `token` is cancelled.
    pub async fn run_continuous(mut self, token: CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("tick loop cancelled");
                    return;
                }
                now = self.ticker.tick() => run_cycle(&self.tracker, now).await,
            }
        }
    }
}

#[instrument(skip(tracker))]
async fn run_cycle(tracker: &Tracker, now: DateTime<Utc>) {
    tracker.tick(now).await;
}
