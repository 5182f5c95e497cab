use std::time::Duration;

use fleet_core::{PositionReport, VesselInfo};
use futures::StreamExt;
use processors::Tracker;
use snafu::ResultExt;
use tokio::{io::AsyncRead, sync::mpsc, time::Instant};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tracing::{Level, event, instrument};

use crate::{
    error::{
        AisMessageError, Result,
        ais_message_error::{DeserializeSnafu, LineSnafu},
        error::{HeartbeatTimeoutSnafu, StreamClosedSnafu},
    },
    models::{AisMessage, AisMessageType, AisPosition, AisStatic, MessageType},
};

pub const MAX_LINE_LENGTH: usize = 1000;

pub struct Consumer {
    commit_interval: Duration,
    heartbeat_timeout: Duration,
    process_confirmation: Option<mpsc::Sender<()>>,
}

impl Consumer {
    pub fn new(commit_interval: Duration, heartbeat_timeout: Duration) -> Consumer {
        Consumer {
            commit_interval,
            heartbeat_timeout,
            process_confirmation: None,
        }
    }

    /// Signals `sender` every time a batch of messages has been handed to the tracker.
    pub fn with_process_confirmation(mut self, sender: mpsc::Sender<()>) -> Consumer {
        self.process_confirmation = Some(sender);
        self
    }

    /// Consumes newline delimited ais messages from `source` and feeds them to `tracker` in
    /// batches every commit interval.
    ///
    /// Only returns when the upstream closes the stream or stays silent for longer than the
    /// heartbeat timeout.
    pub async fn run(&self, source: impl AsyncRead + Unpin, tracker: &Tracker) -> Result<()> {
        let codec = LinesCodec::new_with_max_length(MAX_LINE_LENGTH);
        let mut framed_read = FramedRead::new(source, codec);

        // This vector is never deallocated and will match the size of
        // highest amount of messages received during a commit interval.
        let mut buffer = Vec::new();

        let mut interval = tokio::time::interval(self.commit_interval);
        let heartbeat = tokio::time::sleep(self.heartbeat_timeout);
        tokio::pin!(heartbeat);

        loop {
            tokio::select! {
                message = framed_read.next() => {
                    match message {
                        Some(message) => {
                            heartbeat.as_mut().reset(Instant::now() + self.heartbeat_timeout);
                            buffer.push(message);
                        }
                        None => {
                            self.commit(&mut buffer, tracker).await;
                            return StreamClosedSnafu.fail();
                        }
                    }
                }
                _ = interval.tick() => self.commit(&mut buffer, tracker).await,
                _ = &mut heartbeat => {
                    self.commit(&mut buffer, tracker).await;
                    return HeartbeatTimeoutSnafu {
                        timeout: self.heartbeat_timeout,
                    }
                    .fail();
                }
            }
        }
    }

    async fn commit(
        &self,
        buffer: &mut Vec<std::result::Result<String, LinesCodecError>>,
        tracker: &Tracker,
    ) {
        if buffer.is_empty() {
            return;
        }

        process_messages(buffer.drain(..), tracker).await;

        if let Some(confirmation) = &self.process_confirmation {
            // The receiving test may already have finished
            let _ = confirmation.send(()).await;
        }
    }
}

#[instrument(skip_all, fields(app.num_messages, app.num_rejected))]
async fn process_messages<T>(messages: T, tracker: &Tracker)
where
    T: IntoIterator<Item = std::result::Result<String, LinesCodecError>>,
{
    let mut num_messages = 0;
    let mut num_rejected = 0;

    for message in messages {
        num_messages += 1;
        match parse_message(message) {
            Err(e) => {
                num_rejected += 1;
                event!(Level::ERROR, "failed to consume ais message: {e:?}");
            }
            Ok(AisMessage::Static(m)) => {
                let (mmsi, msgtime) = (m.mmsi, m.msgtime);
                tracker.apply_static(mmsi, VesselInfo::from(m), msgtime).await;
            }
            Ok(AisMessage::Position(m)) => {
                let Some(report) = Option::<PositionReport>::from(m) else {
                    continue;
                };
                if let Err(e) = tracker.apply_report(&report).await {
                    num_rejected += 1;
                    event!(Level::WARN, "rejected position report: {e:?}");
                }
            }
        }
    }

    let span = tracing::Span::current();
    span.record("app.num_messages", num_messages);
    span.record("app.num_rejected", num_rejected);
}

fn parse_message(
    message: std::result::Result<String, LinesCodecError>,
) -> std::result::Result<AisMessage, AisMessageError> {
    let message = message.context(LineSnafu)?;

    let message_type: MessageType =
        serde_json::from_str(&message).with_context(|_| DeserializeSnafu {
            message: message.clone(),
        })?;

    match message_type.message_type {
        AisMessageType::Position => {
            let val: AisPosition = serde_json::from_str(&message)
                .with_context(|_| DeserializeSnafu {
                    message: message.clone(),
                })?;
            Ok(AisMessage::Position(val))
        }
        AisMessageType::Static => {
            let val: AisStatic = serde_json::from_str(&message)
                .with_context(|_| DeserializeSnafu {
                    message: message.clone(),
                })?;
            Ok(AisMessage::Static(val))
        }
    }
}
