use std::sync::Arc;

use fleet_core::ConnectionEvent;
use processors::{ConnectionController, IntervalTicker, TickLoop, Tracker};
use snafu::ResultExt;
use tokio::{io::AsyncRead, sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use crate::{
    consumer::Consumer,
    error::{
        Result,
        error::{MissingAddressSnafu, TrackerSnafu},
    },
    settings::{Environment, Settings},
    source::{AisSource, HttpAisSource},
};

pub struct App {
    tracker: Arc<Tracker>,
    consumer: Consumer,
    ais_source: Option<Arc<dyn AisSource>>,
    tick_interval: std::time::Duration,
}

impl App {
    pub fn build(settings: &Settings) -> Result<App> {
        let connection =
            ConnectionController::new(settings.reconnect_min_delay, settings.reconnect_max_delay);
        let tracker = Tracker::new(&settings.tracker, connection).context(TrackerSnafu)?;

        let ais_source: Option<Arc<dyn AisSource>> = match settings.environment {
            Environment::Test => None,
            Environment::Local | Environment::Development | Environment::Production => {
                let Some(address) = settings.api_address.clone() else {
                    return MissingAddressSnafu {
                        environment: settings.environment.to_string(),
                    }
                    .fail();
                };
                Some(Arc::new(HttpAisSource::new(address)) as Arc<dyn AisSource>)
            }
        };

        Ok(App {
            tracker: Arc::new(tracker),
            consumer: Consumer::new(settings.commit_interval, settings.heartbeat_timeout),
            ais_source,
            tick_interval: settings.tracker.tick_interval,
        })
    }

    pub fn with_source(mut self, source: Arc<dyn AisSource>) -> App {
        self.ais_source = Some(source);
        self
    }

    pub fn tracker(&self) -> Arc<Tracker> {
        self.tracker.clone()
    }

    /// Runs ingestion and the tick loop until ctrl-c, or until one of them exits unexpectedly.
    pub async fn run(self) -> Result<()> {
        let token = CancellationToken::new();

        let shutdown = token.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("shutting down"),
                Err(e) => error!("failed to listen for shutdown signal: {e:?}"),
            }
            shutdown.cancel();
        });

        self.run_until(token).await
    }

    /// Runs ingestion and the tick loop until `token` is cancelled.
    pub async fn run_until(self, token: CancellationToken) -> Result<()> {
        let mut set = JoinSet::new();

        set.spawn(
            TickLoop::new(self.tracker.clone(), IntervalTicker::new(self.tick_interval))
                .run_continuous(token.clone()),
        );

        match self.ais_source {
            Some(source) => {
                let ingestion = Ingestion {
                    tracker: self.tracker.clone(),
                    consumer: self.consumer,
                    source,
                };
                set.spawn(ingestion.run_continuous(token.clone()));
            }
            None => info!("no ais source configured, only ticking"),
        }

        tokio::select! {
            _ = token.cancelled() => {}
            out = set.join_next() => {
                error!("task exited unexpectedly with output: {out:?}");
                token.cancel();
            }
        }

        while set.join_next().await.is_some() {}

        Ok(())
    }

    /// Consumes `source` until it fails, signalling `process_confirmation` after every batch.
    pub async fn run_test(
        self,
        source: impl AsyncRead + Unpin,
        process_confirmation: mpsc::Sender<()>,
    ) -> Result<()> {
        let consumer = self.consumer.with_process_confirmation(process_confirmation);

        if let Err(e) = self
            .tracker
            .connection()
            .handle(ConnectionEvent::HandshakeSucceeded)
        {
            error!("failed to mark connection as connected: {e:?}");
        }

        consumer.run(source, &self.tracker).await
    }
}

struct Ingestion {
    tracker: Arc<Tracker>,
    consumer: Consumer,
    source: Arc<dyn AisSource>,
}

impl Ingestion {
    async fn run_continuous(self, token: CancellationToken) {
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("ingestion cancelled");
                    return;
                }
                _ = self.run_cycle() => {}
            }
        }
    }

    /// One connection attempt, ending in a reconnect after the backoff.
    #[instrument(skip_all)]
    async fn run_cycle(&self) {
        let connection = self.tracker.connection();

        let event = match self.source.streamer().await {
            Ok(stream) => {
                self.handle(ConnectionEvent::HandshakeSucceeded);
                match self.consumer.run(stream, &self.tracker).await {
                    Ok(()) => ConnectionEvent::UpstreamFailed,
                    Err(e) => {
                        error!("consumer failed: {e:?}");
                        e.connection_event()
                    }
                }
            }
            Err(e) => {
                error!("failed to connect to upstream: {e:?}");
                e.connection_event()
            }
        };

        self.handle(event);

        if let Err(e) = connection.retry_after_backoff().await {
            error!("failed to reconnect: {e:?}");
        }
    }

    fn handle(&self, event: ConnectionEvent) {
        if let Err(e) = self.tracker.connection().handle(event) {
            error!("invalid connection transition: {e:?}");
        }
    }
}
