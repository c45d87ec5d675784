//! Router configuration for the image proxy.
//!
//! # Route Structure
//!
//! ```text
//! /health               - Health check
//! /favicon.ico          - Static favicon
//! /{bucket}/{key...}    - Image endpoint (catch-all)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use image_relay::server::{create_router, RouterConfig};
//! use image_relay::transform::{CacheMode, ImageService};
//!
//! let service = ImageService::new(locator, HttpOrigin::new(None)?, CacheMode::Disk);
//! let router = create_router(service, RouterConfig::new().with_cache_max_age(600));
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{favicon_handler, health_handler, image_handler, AppState};
use crate::io::Origin;
use crate::transform::ImageService;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// File served at `/favicon.ico`
    pub favicon_path: Option<PathBuf>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterConfig {
    /// Create a router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Cache max-age is 1 hour (3600 seconds)
    /// - Tracing is enabled
    /// - No favicon
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: 3600,
            enable_tracing: true,
            favicon_path: None,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }

    pub fn with_favicon(mut self, path: impl Into<PathBuf>) -> Self {
        self.favicon_path = Some(path.into());
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
pub fn create_router<O>(image_service: ImageService<O>, config: RouterConfig) -> Router
where
    O: Origin + 'static,
{
    create_shared_router(Arc::new(image_service), config)
}

/// Create the application router around a service that is shared elsewhere
/// (for example with the cache janitor).
pub fn create_shared_router<O>(image_service: Arc<ImageService<O>>, config: RouterConfig) -> Router
where
    O: Origin + 'static,
{
    let app_state = AppState::with_shared_service(image_service)
        .with_cache_max_age(config.cache_max_age)
        .with_favicon(config.favicon_path.clone());

    let cors = build_cors_layer(&config);

    let router = Router::new()
        .route("/health", get(health_handler))
        .route("/favicon.ico", get(favicon_handler::<O>))
        .route("/", get(image_handler::<O>))
        .route("/{*path}", get(image_handler::<O>))
        .with_state(app_state)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
