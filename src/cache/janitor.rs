//! Periodic cache purge.
//!
//! The janitor bounds disk usage by clearing every configured bucket root on
//! a fixed period. Invalidation is whole-tree, not per object. The roots
//! themselves are kept so the gate can keep writing into them.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Default sweep period: one week.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Outcome of a single sweep.
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Roots that were cleared, with the number of top-level entries removed
    pub cleared: Vec<(PathBuf, usize)>,

    /// Roots that did not exist
    pub skipped: Vec<PathBuf>,

    /// Roots that could not be cleared, with the error message
    pub failed: Vec<(PathBuf, String)>,
}

/// Background task that purges the cache roots.
pub struct CacheJanitor {
    roots: Vec<PathBuf>,
    interval: Duration,
    sweep_lock: Arc<RwLock<()>>,
}

impl CacheJanitor {
    /// Create a janitor over `roots`.
    ///
    /// `sweep_lock` must be the lock shared with the cache gate (see
    /// [`LocalCacheGate::sweep_lock`](super::LocalCacheGate::sweep_lock)).
    pub fn new<P: Into<PathBuf>>(
        roots: impl IntoIterator<Item = P>,
        interval: Duration,
        sweep_lock: Arc<RwLock<()>>,
    ) -> Self {
        Self {
            roots: roots.into_iter().map(Into::into).collect(),
            interval,
            sweep_lock,
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the janitor on the tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Sweep once per interval, forever. The first sweep happens one full
    /// interval after start.
    pub async fn run(self) {
        if self.interval.is_zero() {
            warn!("Cache janitor interval is zero, janitor disabled");
            return;
        }

        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.sweep().await;
        }
    }

    /// Clear every root now.
    pub async fn sweep(&self) -> SweepReport {
        let _guard = self.sweep_lock.write().await;
        let mut report = SweepReport::default();

        for root in &self.roots {
            match clear_dir(root).await {
                Ok(Some(removed)) => {
                    info!(root = %root.display(), removed = removed, "Cleared cache root");
                    report.cleared.push((root.clone(), removed));
                }
                Ok(None) => {
                    debug!(root = %root.display(), "Cache root does not exist, skipping");
                    report.skipped.push(root.clone());
                }
                Err(e) => {
                    error!(root = %root.display(), error = %e, "Failed to clear cache root");
                    report.failed.push((root.clone(), e.to_string()));
                }
            }
        }

        report
    }
}

/// Remove everything inside `root`. `Ok(None)` if `root` does not exist.
async fn clear_dir(root: &Path) -> std::io::Result<Option<usize>> {
    let mut entries = match fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut removed = 0;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
            fs::remove_dir_all(&path).await?;
        } else {
            fs::remove_file(&path).await?;
        }
        removed += 1;
    }

    Ok(Some(removed))
}
