//! # Image Relay
//!
//! An on-demand image transformation proxy.
//!
//! Requests name an object as `/{bucket}/{key...}`. The proxy maps the bucket
//! alias to a physical root, keeps a local copy of the source image (fetched
//! from the origin on first use), then resizes, re-encodes and optionally
//! watermarks it before responding.
//!
//! ## Features
//!
//! - **Local source cache**: one origin fetch per object, concurrent misses collapsed
//! - **Periodic purge**: a background janitor clears the cache tree
//! - **Resizing**: `width`/`height` and `w`/`h` query parameters
//! - **Format conversion**: JPEG, PNG and WebP output
//! - **Watermarking**: tiled text mark, forced for protected keys
//!
//! ## Architecture
//!
//! - [`object`] - Request path resolution and request types
//! - [`io`] - Origin client abstraction and HTTP implementation
//! - [`cache`] - Local cache gate and janitor
//! - [`transform`] - Dimension resolution, watermarking, codecs and the image service
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use image_relay::{create_router, CacheMode, HttpOrigin, ImageService, LocatorSettings, ObjectLocator, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let locator = ObjectLocator::new(LocatorSettings::new(
//!         "https://images.baleomol.com/",
//!         "baleomol-staging",
//!         "baleomol-production",
//!     ));
//!     let service = ImageService::new(locator, HttpOrigin::new(None)?, CacheMode::Disk);
//!     let router = create_router(service, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod io;
pub mod object;
pub mod server;
pub mod transform;

// Re-export commonly used types
pub use cache::{CacheJanitor, CacheStatus, LocalCacheGate, LocalObject};
pub use config::Config;
pub use error::{IoError, ProxyError, TransformError};
pub use io::{HttpOrigin, Origin, OriginBody};
pub use object::{ImageQuery, ImageRequest, LocatorSettings, ObjectLocator, ResolvedLocation};
pub use server::{create_router, create_shared_router, AppState, RouterConfig};
pub use transform::{
    resolve_dimensions, CacheMode, ImageResponse, ImageService, OutputFormat, TransformExecutor,
    WatermarkPolicy,
};
