use thiserror::Error;

/// I/O errors that can occur while retrieving or caching source objects.
///
/// Cloneable so a single in-flight fetch can hand its result to every waiter.
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Network-level failure talking to the origin
    #[error("Error fetching image: {0}")]
    Fetch(String),

    /// Origin answered with a non-success status
    #[error("Object not found at origin: {url} (status {status})")]
    OriginNotFound { url: String, status: u16 },

    /// Creating directories or writing the cache file failed
    #[error("Failed to write cache file {path}: {message}")]
    Write { path: String, message: String },

    /// Reading a cached file failed
    #[error("Failed to read cache file {path}: {message}")]
    Read { path: String, message: String },
}

/// Errors raised by the transform pipeline.
#[derive(Debug, Clone, Error)]
pub enum TransformError {
    /// Source bytes are not a readable image
    #[error("Error reading image metadata: {message}")]
    Metadata { message: String },

    /// Format conversion or mark compositing failed
    #[error("Error applying watermark: {message}")]
    Watermark { message: String },

    /// Requested or detected format has no encoder
    #[error("Unsupported image format: {format}")]
    UnsupportedFormat { format: String },

    /// Decode, resize or encode failed
    #[error("Error processing image: {message}")]
    Process { message: String },
}

/// Top-level error for a single proxied image request.
#[derive(Debug, Clone, Error)]
pub enum ProxyError {
    /// The request path does not name an object
    #[error("Bad request: {reason}")]
    BadRequest { reason: String },

    #[error(transparent)]
    Io(#[from] IoError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl ProxyError {
    pub fn bad_request(reason: impl Into<String>) -> Self {
        ProxyError::BadRequest {
            reason: reason.into(),
        }
    }
}
