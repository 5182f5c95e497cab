use std::{collections::VecDeque, sync::Arc, time::Duration};

use ais_consumer::{
    error::Result,
    models::AisPosition,
    source::{AisSource, AisStream},
    startup::App,
};
use async_trait::async_trait;
use chrono::Utc;
use fleet_core::{ConnectionState, Mmsi};
use futures::TryStreamExt;
use tokio::sync::Mutex;
use tokio_util::{compat::FuturesAsyncReadCompatExt, sync::CancellationToken};

use crate::helper::{init_tracing, test_settings};

/// Serves one scripted stream per connection attempt, then never answers again.
struct ScriptedSource {
    streams: Mutex<VecDeque<Vec<String>>>,
}

#[async_trait]
impl AisSource for ScriptedSource {
    async fn streamer(&self) -> Result<AisStream> {
        let Some(lines) = self.streams.lock().await.pop_front() else {
            return std::future::pending().await;
        };

        let stream = futures::stream::iter(
            lines
                .into_iter()
                .map(|line| Ok::<_, std::io::Error>(format!("{line}\n"))),
        );

        Ok(Box::pin(stream.into_async_read().compat()))
    }
}

fn position(mmsi: i32) -> String {
    let mut pos = AisPosition::test_default(Mmsi::test_new(mmsi));
    pos.msgtime = Utc::now();
    serde_json::to_string(&pos).unwrap()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_ingestion_reconnects_after_stream_closes() {
    init_tracing();

    let source = ScriptedSource {
        streams: Mutex::new(VecDeque::from([
            vec![position(1)],
            vec![position(2), position(3)],
        ])),
    };

    let app = App::build(&test_settings())
        .unwrap()
        .with_source(Arc::new(source));
    let tracker = app.tracker();

    let token = CancellationToken::new();
    let handle = tokio::spawn(app.run_until(token.clone()));

    let mut attempts = 0;
    while tracker.vessels().await.len() < 3 {
        attempts += 1;
        assert!(attempts < 500, "vessels were never ingested");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // The third attempt hangs while connecting
    let mut attempts = 0;
    while tracker.connection().state() != ConnectionState::Connecting {
        attempts += 1;
        assert!(attempts < 500, "connection never returned to connecting");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(tracker.connection().status().last_update_at.is_some());

    token.cancel();
    handle.await.unwrap().unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cancelled_app_without_source_stops() {
    init_tracing();

    let app = App::build(&test_settings()).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    app.run_until(token).await.unwrap();
}
