use std::{
    sync::{Mutex, PoisonError},
    time::Duration,
};

use backon::{BackoffBuilder, ExponentialBackoff, ExponentialBuilder};
use chrono::{DateTime, Utc};
use fleet_core::{ConnectionEvent, ConnectionState, ConnectionStatus};
use snafu::ResultExt;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{Result, error::error::CoreSnafu};

/// Owns the health state of the upstream ingest channel.
///
/// Collaborators only get read access through [`ConnectionController::status`] and
/// [`ConnectionController::subscribe`], every state change goes through
/// [`ConnectionController::handle`].
pub struct ConnectionController {
    status: watch::Sender<ConnectionStatus>,
    backoff_builder: ExponentialBuilder,
    max_delay: Duration,
    // `None` until the first retry after a successful handshake
    backoff: Mutex<Option<ExponentialBackoff>>,
}

impl ConnectionController {
    pub fn new(min_delay: Duration, max_delay: Duration) -> ConnectionController {
        let (status, _) = watch::channel(ConnectionStatus::default());
        ConnectionController {
            status,
            backoff_builder: ExponentialBuilder::default()
                .with_min_delay(min_delay)
                .with_max_delay(max_delay)
                .without_max_times(),
            max_delay,
            backoff: Mutex::new(None),
        }
    }

    /// Applies `event` to the current state. Invalid transitions leave the state unchanged.
    pub fn handle(&self, event: ConnectionEvent) -> Result<ConnectionState> {
        let mut outcome = Ok(ConnectionState::default());
        let mut from = ConnectionState::default();

        self.status.send_if_modified(|status| {
            from = status.state;
            match status.state.transition(event) {
                Ok(next) => {
                    status.state = next;
                    outcome = Ok(next);
                    true
                }
                Err(e) => {
                    outcome = Err(e);
                    false
                }
            }
        });

        let next = outcome.context(CoreSnafu)?;
        match next {
            ConnectionState::Connected => {
                self.reset_backoff();
                info!(%event, %from, to = %next, "upstream connected");
            }
            ConnectionState::Disconnected => {
                warn!(%event, %from, to = %next, "upstream disconnected");
            }
            ConnectionState::Connecting => {
                info!(%event, %from, to = %next, "reconnecting to upstream");
            }
        }

        Ok(next)
    }

    /// Records that a report was processed at `timestamp`.
    pub fn record_update(&self, timestamp: DateTime<Utc>) {
        self.status.send_if_modified(|status| {
            if status.last_update_at.is_some_and(|t| t >= timestamp) {
                false
            } else {
                status.last_update_at = Some(timestamp);
                true
            }
        });
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    pub fn state(&self) -> ConnectionState {
        self.status.borrow().state
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Delay to wait before the next reconnect attempt, growing exponentially until a
    /// handshake succeeds.
    pub fn next_backoff(&self) -> Duration {
        let mut backoff = self.backoff.lock().unwrap_or_else(PoisonError::into_inner);
        backoff
            .get_or_insert_with(|| self.backoff_builder.clone().build())
            .next()
            .unwrap_or(self.max_delay)
    }

    /// Waits out the backoff and moves a disconnected channel back to connecting.
    pub async fn retry_after_backoff(&self) -> Result<ConnectionState> {
        let delay = self.next_backoff();
        info!(?delay, "waiting before reconnecting");
        tokio::time::sleep(delay).await;
        self.handle(ConnectionEvent::RetryElapsed)
    }

    fn reset_backoff(&self) {
        *self.backoff.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn controller() -> ConnectionController {
        ConnectionController::new(Duration::from_millis(100), Duration::from_secs(2))
    }

    #[test]
    fn test_starts_connecting_without_updates() {
        let status = controller().status();
        assert_eq!(status.state, ConnectionState::Connecting);
        assert!(status.last_update_at.is_none());
    }

    #[test]
    fn test_invalid_transition_leaves_state_unchanged() {
        let c = controller();
        let err = c.handle(ConnectionEvent::RetryElapsed).unwrap_err();

        assert!(!err.is_not_found());
        assert_eq!(c.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_subscribers_observe_transitions() {
        let c = controller();
        let mut rx = c.subscribe();

        c.handle(ConnectionEvent::HandshakeSucceeded).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().state, ConnectionState::Connected);

        c.handle(ConnectionEvent::HeartbeatTimedOut).unwrap();
        assert_eq!(rx.borrow_and_update().state, ConnectionState::Disconnected);
    }

    #[test]
    fn test_record_update_keeps_latest_timestamp() {
        let c = controller();
        let late = Utc.timestamp_opt(2_000, 0).unwrap();
        let early = Utc.timestamp_opt(1_000, 0).unwrap();

        c.record_update(late);
        c.record_update(early);

        assert_eq!(c.status().last_update_at, Some(late));
    }

    #[test]
    fn test_backoff_grows_and_resets_after_handshake() {
        let c = controller();

        let first = c.next_backoff();
        let second = c.next_backoff();
        assert_eq!(first, Duration::from_millis(100));
        assert!(second > first);

        for _ in 0..20 {
            assert!(c.next_backoff() <= Duration::from_secs(2));
        }

        c.handle(ConnectionEvent::HandshakeSucceeded).unwrap();
        assert_eq!(c.next_backoff(), Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_after_backoff_reconnects() {
        let c = controller();
        c.handle(ConnectionEvent::UpstreamFailed).unwrap();

        let state = c.retry_after_backoff().await.unwrap();
        assert_eq!(state, ConnectionState::Connecting);
    }
}
