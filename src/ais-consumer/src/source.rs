use std::pin::Pin;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use snafu::ResultExt;
use tokio::io::AsyncRead;
use tokio_util::compat::FuturesAsyncReadCompatExt;

use crate::error::{
    Result,
    error::{FailedRequestSnafu, RequestSnafu},
};

pub type AisStream = Pin<Box<dyn AsyncRead + Send>>;

/// Upstream provider of a newline delimited json ais stream.
#[async_trait]
pub trait AisSource: Send + Sync {
    /// Opens a new stream, a successful return means the handshake with upstream succeeded.
    async fn streamer(&self) -> Result<AisStream>;
}

pub struct HttpAisSource {
    api_address: String,
    client: Client,
}

impl HttpAisSource {
    pub fn new(api_address: String) -> HttpAisSource {
        HttpAisSource {
            api_address,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl AisSource for HttpAisSource {
    /// Returns the ais source as stream which will continuously receive data from the source.
    async fn streamer(&self) -> Result<AisStream> {
        let response = self
            .client
            .get(&self.api_address)
            .header("Accept", "application/x-ndjson")
            .send()
            .await
            .context(RequestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            return FailedRequestSnafu {
                url: self.api_address.clone(),
                status,
                body: response.text().await.context(RequestSnafu)?,
            }
            .fail();
        }

        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(|e| std::io::Error::other(format!("{e:?}"))))
            .into_async_read();

        Ok(Box::pin(stream.compat()))
    }
}
