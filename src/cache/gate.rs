//! Local cache gate.
//!
//! Decides whether an object must be fetched from the origin and persisted,
//! or whether the local copy can be reused. The local path is the cache key
//! and a non-empty regular file at that path is a hit. Entries carry no TTL;
//! they live until the [`CacheJanitor`](super::CacheJanitor) clears the tree.
//!
//! # Persistence
//!
//! Bodies are streamed into a hidden `.part` file next to the target and
//! renamed into place once complete, so the local path only ever holds whole
//! objects. A failed or cancelled fetch drops the partial file.
//!
//! # Concurrency
//!
//! - Concurrent misses on the same key collapse into one origin fetch. Every
//!   waiter receives the leader's bytes.
//! - Gate operations hold the read side of the sweep lock only for local
//!   filesystem steps (hit check and read, partial file creation, rename).
//!   Janitor sweeps take the write side. The origin fetch runs unlocked, so a
//!   slow origin never holds up a sweep or the hits queued behind it.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tempfile::TempPath;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OnceCell, RwLock};
use tracing::{debug, info, warn};

use crate::error::IoError;
use crate::io::{Origin, OriginBody};
use crate::object::ResolvedLocation;

/// Suffix of in-progress downloads.
const PARTIAL_SUFFIX: &str = ".part";

// =============================================================================
// Cache Status
// =============================================================================

/// How the source bytes for a request were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from an existing local file
    Hit,
    /// Fetched from the origin and persisted
    Miss,
    /// Fetched from the origin without touching the disk cache
    Bypass,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
            CacheStatus::Bypass => "bypass",
        }
    }
}

/// Source bytes together with how they were obtained.
#[derive(Debug, Clone)]
pub struct LocalObject {
    pub data: Bytes,
    pub status: CacheStatus,
}

// =============================================================================
// Local Cache Gate
// =============================================================================

/// Completion slot shared by every request waiting on one fetch.
struct InFlightFetch {
    result: OnceCell<Result<Bytes, IoError>>,
}

/// Fetch-and-persist gate over the local cache tree.
pub struct LocalCacheGate<O: Origin> {
    /// Origin consulted on a miss
    origin: Arc<O>,

    /// Shared with the janitor; readers are gate operations
    sweep_lock: Arc<RwLock<()>>,

    /// In-flight fetches keyed by local path
    in_flight: Mutex<HashMap<String, Arc<InFlightFetch>>>,
}

impl<O: Origin> LocalCacheGate<O> {
    /// Create a gate with its own sweep lock.
    pub fn new(origin: Arc<O>) -> Self {
        Self::with_sweep_lock(origin, Arc::new(RwLock::new(())))
    }

    /// Create a gate sharing `sweep_lock` with a janitor.
    pub fn with_sweep_lock(origin: Arc<O>, sweep_lock: Arc<RwLock<()>>) -> Self {
        Self {
            origin,
            sweep_lock,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// The lock a janitor must hold while sweeping this gate's tree.
    pub fn sweep_lock(&self) -> Arc<RwLock<()>> {
        Arc::clone(&self.sweep_lock)
    }

    /// Make sure the object exists locally, fetching it on a miss.
    ///
    /// # Errors
    ///
    /// - [`IoError::OriginNotFound`] if the origin answered with a non-success status
    /// - [`IoError::Fetch`] on network failure
    /// - [`IoError::Write`] if the directories or the file cannot be written
    pub async fn ensure_local(&self, location: &ResolvedLocation) -> Result<CacheStatus, IoError> {
        {
            let _guard = self.sweep_lock.read().await;
            if is_cached(&location.local_path).await {
                debug!(path = %location.local_path, "Cache hit");
                return Ok(CacheStatus::Hit);
            }
        }

        self.fetch_shared(location).await.map(|_| CacheStatus::Miss)
    }

    /// Return the object's bytes, from the local copy or from the origin.
    ///
    /// A hit is checked and read under one read guard, so a sweep cannot
    /// delete the file in between. A miss returns the bytes of the fetch
    /// that persisted it.
    ///
    /// # Errors
    ///
    /// As [`ensure_local`](Self::ensure_local), plus [`IoError::Read`] if an
    /// existing local copy cannot be read.
    pub async fn load(&self, location: &ResolvedLocation) -> Result<LocalObject, IoError> {
        if let Some(data) = self.read_cached(location).await? {
            return Ok(LocalObject {
                data,
                status: CacheStatus::Hit,
            });
        }

        let data = self.fetch_shared(location).await?;
        Ok(LocalObject {
            data,
            status: CacheStatus::Miss,
        })
    }

    /// Number of fetches currently in flight.
    pub async fn in_flight_count(&self) -> usize {
        self.in_flight.lock().await.len()
    }

    async fn read_cached(&self, location: &ResolvedLocation) -> Result<Option<Bytes>, IoError> {
        let _guard = self.sweep_lock.read().await;
        if !is_cached(&location.local_path).await {
            return Ok(None);
        }

        debug!(path = %location.local_path, "Cache hit");
        let data = fs::read(&location.local_path)
            .await
            .map_err(|e| IoError::Read {
                path: location.local_path.clone(),
                message: e.to_string(),
            })?;

        Ok(Some(Bytes::from(data)))
    }

    /// Join the in-flight fetch for this key, starting one if there is none.
    async fn fetch_shared(&self, location: &ResolvedLocation) -> Result<Bytes, IoError> {
        let key = location.local_path.clone();
        let state = {
            let mut in_flight = self.in_flight.lock().await;
            in_flight
                .entry(key.clone())
                .or_insert_with(|| {
                    Arc::new(InFlightFetch {
                        result: OnceCell::new(),
                    })
                })
                .clone()
        };

        // Only one caller runs the fetch; the rest wait for its result
        let result = state
            .result
            .get_or_init(|| self.fetch_and_persist(location))
            .await
            .clone();

        {
            let mut in_flight = self.in_flight.lock().await;
            if in_flight
                .get(&key)
                .is_some_and(|current| Arc::ptr_eq(current, &state))
            {
                in_flight.remove(&key);
            }
        }

        result
    }

    async fn fetch_and_persist(&self, location: &ResolvedLocation) -> Result<Bytes, IoError> {
        // A fetch for this key may have finished since the caller's hit check
        if let Some(data) = self.read_cached(location).await? {
            return Ok(data);
        }

        let mut body = self.origin.open(&location.origin_url).await?;

        let path = Path::new(&location.local_path);
        let (mut file, partial) = {
            let _guard = self.sweep_lock.read().await;
            create_partial(path, &location.local_path).await?
        };

        // Dropping `partial` on any early return removes the file
        let data = copy_body(&mut body, &mut file, &location.local_path).await?;
        drop(file);

        let _guard = self.sweep_lock.read().await;
        let renamed = fs::rename(&partial, path).await;
        match renamed {
            Ok(()) => {
                let _ = partial.keep();
                info!(
                    path = %location.local_path,
                    bytes = data.len(),
                    "Cached object from origin"
                );
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    path = %location.local_path,
                    "Cache tree swept during fetch, object not persisted"
                );
            }
            Err(e) => {
                return Err(IoError::Write {
                    path: location.local_path.clone(),
                    message: e.to_string(),
                });
            }
        }

        Ok(data)
    }
}

/// `true` when a non-empty regular file exists at `path`.
pub async fn is_cached(path: impl AsRef<Path>) -> bool {
    match fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}

/// Create the parent directories of `target` and a uniquely named partial
/// file beside it. The file is deleted when the returned [`TempPath`] drops.
async fn create_partial(target: &Path, display: &str) -> Result<(File, TempPath), IoError> {
    let write_err = |message: String| IoError::Write {
        path: display.to_string(),
        message,
    };

    let parent = target
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    fs::create_dir_all(&parent)
        .await
        .map_err(|e| write_err(e.to_string()))?;

    let prefix = format!(
        ".{}.",
        target
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("object")
    );
    let temp = tokio::task::spawn_blocking(move || {
        tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(PARTIAL_SUFFIX)
            .tempfile_in(parent)
    })
    .await
    .map_err(|e| write_err(e.to_string()))?
    .map_err(|e| write_err(e.to_string()))?;

    let (file, partial) = temp.into_parts();
    Ok((File::from_std(file), partial))
}

async fn copy_body<B: OriginBody>(
    body: &mut B,
    file: &mut File,
    path: &str,
) -> Result<Bytes, IoError> {
    let write_err = |e: std::io::Error| IoError::Write {
        path: path.to_string(),
        message: e.to_string(),
    };

    let mut data = BytesMut::new();
    while let Some(chunk) = body.next_chunk().await? {
        file.write_all(&chunk).await.map_err(write_err)?;
        data.extend_from_slice(&chunk);
    }
    file.flush().await.map_err(write_err)?;

    Ok(data.freeze())
}

// =============================================================================
// Tests
// =============================================================================
