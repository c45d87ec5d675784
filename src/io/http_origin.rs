use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::{Origin, OriginBody};
use crate::error::IoError;

/// HTTP implementation of [`Origin`] backed by `reqwest`.
///
/// Objects are retrieved with a plain `GET`. Any non-2xx status is reported
/// as [`IoError::OriginNotFound`].
#[derive(Clone)]
pub struct HttpOrigin {
    client: reqwest::Client,
}

impl HttpOrigin {
    /// Create an origin client.
    ///
    /// `timeout` bounds the whole request including the body; `None` waits
    /// indefinitely.
    pub fn new(timeout: Option<Duration>) -> Result<Self, IoError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|e| IoError::Fetch(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wrap an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    type Body = HttpBody;

    async fn open(&self, url: &str) -> Result<Self::Body, IoError> {
        debug!(url = url, "Fetching from origin");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IoError::Fetch(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IoError::OriginNotFound {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(HttpBody { response })
    }
}

/// Streaming body of an origin response.
pub struct HttpBody {
    response: reqwest::Response,
}

#[async_trait]
impl OriginBody for HttpBody {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, IoError> {
        self.response
            .chunk()
            .await
            .map_err(|e| IoError::Fetch(e.to_string()))
    }
}
