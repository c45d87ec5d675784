//! HTTP request handlers for the image proxy.
//!
//! # Endpoints
//!
//! - `GET /{bucket}/{key...}` - Serve a transformed image
//! - `GET /favicon.ico` - Serve the configured favicon
//! - `GET /health` - Health check endpoint

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderName, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::error::{IoError, ProxyError};
use crate::io::Origin;
use crate::object::ImageQuery;
use crate::transform::ImageService;

/// Response header reporting how the source bytes were obtained.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-cache-status");

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the image service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<O: Origin> {
    /// The image service for processing image requests
    pub image_service: Arc<ImageService<O>>,

    /// Cache-Control max-age in seconds (defaults to 1 hour)
    pub cache_max_age: u32,

    /// Favicon served at `/favicon.ico`, if any
    pub favicon_path: Option<PathBuf>,
}

impl<O: Origin + 'static> AppState<O> {
    pub fn new(image_service: ImageService<O>) -> Self {
        Self::with_shared_service(Arc::new(image_service))
    }

    pub fn with_shared_service(image_service: Arc<ImageService<O>>) -> Self {
        Self {
            image_service,
            cache_max_age: 3600,
            favicon_path: None,
        }
    }

    pub fn with_cache_max_age(mut self, cache_max_age: u32) -> Self {
        self.cache_max_age = cache_max_age;
        self
    }

    pub fn with_favicon(mut self, path: Option<PathBuf>) -> Self {
        self.favicon_path = path;
        self
    }
}

impl<O: Origin> Clone for AppState<O> {
    fn clone(&self) -> Self {
        Self {
            image_service: Arc::clone(&self.image_service),
            cache_max_age: self.cache_max_age,
            favicon_path: self.favicon_path.clone(),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

impl ProxyError {
    /// HTTP status and a short error type for logs.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ProxyError::BadRequest { .. } => (StatusCode::BAD_REQUEST, "bad_request"),
            ProxyError::Io(IoError::OriginNotFound { .. }) => (StatusCode::NOT_FOUND, "not_found"),
            ProxyError::Io(IoError::Fetch(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "fetch_error"),
            ProxyError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "cache_error"),
            ProxyError::Transform(_) => (StatusCode::INTERNAL_SERVER_ERROR, "transform_error"),
        }
    }
}

/// Convert ProxyError to a plain-text HTTP response.
///
/// 5xx is logged at ERROR, 404 at DEBUG and other 4xx at WARN.
impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, error_type) = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                message
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                message
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                message
            );
        }

        (status, message).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle image requests.
///
/// # Endpoint
///
/// `GET /{bucket}/{key...}`
///
/// # Query Parameters
///
/// - `width`, `height`: target size
/// - `w`, `h`: target size, applied after `width`/`height`
/// - `format`: `jpeg`, `jpg`, `png` or `webp`
/// - `watermark`: `true` forces the watermark
///
/// # Response
///
/// - `200 OK`: transformed image
/// - `400 Bad Request`: path does not name an object
/// - `404 Not Found`: origin has no such object
/// - `500 Internal Server Error`: fetch, cache or transform failure
///
/// # Headers
///
/// - `Content-Type: image/<format>`
/// - `Cache-Control: public, max-age={cache_max_age}`
/// - `X-Cache-Status: hit|miss|bypass`
pub async fn image_handler<O: Origin + 'static>(
    State(state): State<AppState<O>>,
    uri: Uri,
    Query(query): Query<ImageQuery>,
) -> Result<Response, ProxyError> {
    let response = state.image_service.process(uri.path(), query).await?;

    Ok((
        [
            (header::CONTENT_TYPE, response.content_type.to_string()),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={}", state.cache_max_age),
            ),
            (CACHE_STATUS_HEADER, response.cache_status.as_str().to_string()),
        ],
        response.data,
    )
        .into_response())
}

/// Serve the favicon from disk, 404 when unset or missing.
pub async fn favicon_handler<O: Origin + 'static>(State(state): State<AppState<O>>) -> Response {
    let Some(path) = state.favicon_path.as_ref() else {
        return StatusCode::NOT_FOUND.into_response();
    };

    match tokio::fs::read(path).await {
        Ok(data) => ([(header::CONTENT_TYPE, "image/x-icon")], data).into_response(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Favicon not available");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Handle health check requests.
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
