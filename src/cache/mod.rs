//! Local disk cache.
//!
//! The cache tree mirrors `{bucket_root}/{object_key}` for every object
//! fetched from the origin.
//!
//! ```text
//! ┌──────────────────────┐   read lock   ┌────────────────────────────┐
//! │    LocalCacheGate    │ ────────────▶ │                            │
//! │ (hit / fetch+persist)│               │  {staging_root}/...        │
//! └──────────────────────┘               │  {production_root}/...     │
//! ┌──────────────────────┐  write lock   │                            │
//! │     CacheJanitor     │ ────────────▶ │                            │
//! │   (weekly purge)     │               └────────────────────────────┘
//! └──────────────────────┘
//! ```

mod gate;
mod janitor;

pub use gate::{is_cached, CacheStatus, LocalCacheGate, LocalObject};
pub use janitor::{CacheJanitor, SweepReport, DEFAULT_SWEEP_INTERVAL};
