//! Image transformation.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      ImageService                        │
//! │   locate ─▶ fetch_source (gate / origin) ─▶ transform    │
//! └──────────────────────────────┬───────────────────────────┘
//!                                │ spawn_blocking
//!                                ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │                   TransformExecutor                      │
//! │  metadata │ watermark │ dimensions │ resize │ encode     │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod dimensions;
mod encoder;
mod executor;
mod format;
mod service;
mod watermark;

pub use dimensions::{fill_unspecified, resolve_dimensions, resolve_request_dimensions};
pub use encoder::{
    decode, encode, png_compression, resize, EncodeOptions, DEFAULT_JPEG_QUALITY,
    MAX_JPEG_QUALITY, MIN_JPEG_QUALITY, PNG_COMPRESSION_LEVEL,
};
pub use executor::{TransformExecutor, TransformOutput, TransformPlan, DEFAULT_MAX_DIMENSION};
pub use format::{read_metadata, ImageMetadata, OutputFormat, SourceFormat};
pub use service::{CacheMode, ImageResponse, ImageService};
pub use watermark::{
    requires_watermark, WatermarkPolicy, PROTECTED_KEY_SEGMENT, WATERMARK_DPI, WATERMARK_MARGIN,
    WATERMARK_OPACITY, WATERMARK_TEXT, WATERMARK_WIDTH_POINTS,
};
