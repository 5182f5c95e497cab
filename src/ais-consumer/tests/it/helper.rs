use std::{future::Future, sync::Arc, time::Duration};

use ais_consumer::{
    models::{AisPosition, AisStatic},
    settings::{Environment, LogLevel, Settings},
    startup::App,
};
use fleet_core::GeofenceDefinition;
use futures::TryStreamExt;
use processors::{Tracker, TrackerSettings};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::compat::FuturesAsyncReadCompatExt;

pub struct TestHelper {
    pub ais_source: AisSource,
    pub tracker: Arc<Tracker>,
    pub process_confirmation: mpsc::Receiver<()>,
}

pub struct AisSource {
    out: mpsc::Sender<Result<String, std::io::Error>>,
}

pub fn test_settings() -> Settings {
    Settings {
        environment: Environment::Test,
        log_level: LogLevel::Debug,
        commit_interval: Duration::from_millis(5),
        heartbeat_timeout: Duration::from_secs(60),
        reconnect_min_delay: Duration::from_millis(5),
        reconnect_max_delay: Duration::from_millis(50),
        api_address: None,
        tracker: TrackerSettings {
            geofences: vec![GeofenceDefinition {
                id: "harbour".into(),
                name: "Harbour".into(),
                polygon: vec![[26.0, -80.0], [26.0, -79.0], [27.0, -79.0], [27.0, -80.0]],
            }],
            ..Default::default()
        },
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

pub async fn test<T, Fut>(test_closure: T)
where
    T: FnOnce(TestHelper) -> Fut,
    Fut: Future<Output = ()>,
{
    init_tracing();

    let app = App::build(&test_settings()).unwrap();
    let tracker = app.tracker();

    let (confirmation_sender, confirmation_receiver) = mpsc::channel(100);
    let (sender, recv) = mpsc::channel(100);

    let compat = ReceiverStream::new(recv).into_async_read().compat();

    tokio::spawn(app.run_test(compat, confirmation_sender));

    let helper = TestHelper {
        ais_source: AisSource { out: sender },
        tracker,
        process_confirmation: confirmation_receiver,
    };

    test_closure(helper).await;
}

impl TestHelper {
    /// Waits until the consumer has handed the next batch to the tracker.
    pub async fn processed(&mut self) {
        self.process_confirmation.recv().await.unwrap();
    }
}

impl AisSource {
    pub async fn send_position(&self, position: &AisPosition) {
        let string = serde_json::to_string(position).unwrap();
        self.send_string(string).await
    }

    pub async fn send_static(&self, static_message: &AisStatic) {
        let string = serde_json::to_string(static_message).unwrap();
        self.send_string(string).await
    }

    pub async fn send_string(&self, mut val: String) {
        val.push('\n');
        self.out.send(Ok(val)).await.unwrap();
    }
}
