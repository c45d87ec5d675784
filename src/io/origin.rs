use async_trait::async_trait;
use bytes::{Bytes, BytesMut};

use crate::error::IoError;

/// Trait for retrieving objects from the remote origin.
///
/// This abstraction lets the cache gate and the in-memory pipeline work with
/// any transport (HTTP, test doubles) without being tied to one client.
#[async_trait]
pub trait Origin: Send + Sync {
    /// The body type returned by a successful request.
    type Body: OriginBody + 'static;

    /// Start retrieving `url`.
    ///
    /// Returns [`IoError::OriginNotFound`] when the origin answers with a
    /// non-success status and [`IoError::Fetch`] on network failure.
    async fn open(&self, url: &str) -> Result<Self::Body, IoError>;
}

/// A response body that is consumed chunk by chunk.
#[async_trait]
pub trait OriginBody: Send {
    /// Next chunk of the body, or `None` once the body is exhausted.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, IoError>;

    /// Collect the remaining body into one buffer.
    async fn read_to_end(mut self) -> Result<Bytes, IoError>
    where
        Self: Sized,
    {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.next_chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}
