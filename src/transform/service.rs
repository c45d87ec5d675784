//! Image service: the single entry point for proxied image requests.
//!
//! Ties the locator, the cache gate and the transform executor together:
//!
//! 1. Resolve the request path to a bucket and object key
//! 2. Obtain the source bytes (local cache or origin)
//! 3. Transform on the blocking pool
//! 4. Return the encoded bytes with their content type and cache status

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use clap::ValueEnum;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::executor::TransformExecutor;
use crate::cache::{CacheJanitor, CacheStatus, LocalCacheGate, LocalObject};
use crate::error::{IoError, ProxyError, TransformError};
use crate::io::{Origin, OriginBody};
use crate::object::{ImageQuery, ImageRequest, ObjectLocator, ResolvedLocation};

/// Where source bytes are kept between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CacheMode {
    /// Persist every fetched object under the bucket roots
    #[default]
    Disk,
    /// Fetch from the origin on every request, keep nothing
    None,
}

/// A transformed image ready to be sent.
#[derive(Debug, Clone)]
pub struct ImageResponse {
    /// Encoded image bytes
    pub data: Bytes,

    /// `image/<format>`
    pub content_type: &'static str,

    /// How the source bytes were obtained
    pub cache_status: CacheStatus,
}

enum SourceStore<O: Origin> {
    Disk(LocalCacheGate<O>),
    Direct(Arc<O>),
}

/// Resolves, fetches and transforms images.
pub struct ImageService<O: Origin> {
    locator: ObjectLocator,
    store: SourceStore<O>,
    executor: Arc<TransformExecutor>,
}

impl<O: Origin + 'static> ImageService<O> {
    /// Create a service with default transform settings.
    pub fn new(locator: ObjectLocator, origin: O, mode: CacheMode) -> Self {
        Self::with_executor(locator, Arc::new(origin), mode, TransformExecutor::new())
    }

    /// Create a service with a configured executor.
    pub fn with_executor(
        locator: ObjectLocator,
        origin: Arc<O>,
        mode: CacheMode,
        executor: TransformExecutor,
    ) -> Self {
        let store = match mode {
            CacheMode::Disk => SourceStore::Disk(LocalCacheGate::new(origin)),
            CacheMode::None => SourceStore::Direct(origin),
        };
        Self {
            locator,
            store,
            executor: Arc::new(executor),
        }
    }

    pub fn locator(&self) -> &ObjectLocator {
        &self.locator
    }

    pub fn cache_mode(&self) -> CacheMode {
        match self.store {
            SourceStore::Disk(_) => CacheMode::Disk,
            SourceStore::Direct(_) => CacheMode::None,
        }
    }

    /// Sweep lock of the disk cache, `None` when caching is off.
    pub fn sweep_lock(&self) -> Option<Arc<RwLock<()>>> {
        match &self.store {
            SourceStore::Disk(gate) => Some(gate.sweep_lock()),
            SourceStore::Direct(_) => None,
        }
    }

    /// Build a janitor over both bucket roots sharing this service's sweep
    /// lock. `None` when caching is off.
    pub fn janitor(&self, interval: Duration) -> Option<CacheJanitor> {
        let lock = self.sweep_lock()?;
        Some(CacheJanitor::new(self.locator.bucket_roots(), interval, lock))
    }

    /// Obtain the source bytes for a location.
    pub async fn fetch_source(&self, location: &ResolvedLocation) -> Result<LocalObject, IoError> {
        match &self.store {
            SourceStore::Disk(gate) => {
                let object = gate.load(location).await?;
                if object.status == CacheStatus::Miss
                    && self.locator.is_pass_through(&location.bucket_alias)
                {
                    warn!(
                        path = %location.local_path,
                        "Cached object outside the janitor's bucket roots"
                    );
                }
                Ok(object)
            }
            SourceStore::Direct(origin) => {
                let data = origin.open(&location.origin_url).await?.read_to_end().await?;
                Ok(LocalObject {
                    data,
                    status: CacheStatus::Bypass,
                })
            }
        }
    }

    /// Handle one image request end to end.
    ///
    /// # Errors
    ///
    /// - [`ProxyError::BadRequest`] if the path does not name an object
    /// - [`ProxyError::Io`] if the source cannot be fetched or cached
    /// - [`ProxyError::Transform`] if the bytes cannot be transformed
    pub async fn process(&self, path: &str, query: ImageQuery) -> Result<ImageResponse, ProxyError> {
        let location = self.locator.locate(path)?;
        let request = ImageRequest::from_query(&location, query);

        let source = self.fetch_source(&location).await?;
        debug!(
            bucket = %location.bucket_alias,
            key = %location.object_key,
            cache = source.status.as_str(),
            bytes = source.data.len(),
            "Source ready"
        );

        let executor = Arc::clone(&self.executor);
        let data = source.data;
        let output = tokio::task::spawn_blocking(move || executor.transform(&data, &request))
            .await
            .map_err(|e| TransformError::Process {
                message: format!("transform task failed: {}", e),
            })??;

        Ok(ImageResponse {
            content_type: output.content_type(),
            data: output.data,
            cache_status: source.status,
        })
    }
}
