//! Transform pipeline.
//!
//! ```text
//! raw bytes ─▶ metadata ─▶ decode ─▶ watermark? ─▶ resolve size
//!                                                     │
//!                      bytes ◀─ encode ◀─ resize ◀────┘
//! ```
//!
//! Every step is CPU-bound and synchronous. Callers on the async runtime
//! should run [`TransformExecutor::transform`] inside `spawn_blocking`.

use bytes::Bytes;
use image::DynamicImage;
use tracing::debug;

use super::dimensions::{fill_unspecified, resolve_request_dimensions};
use super::encoder::{decode, encode, resize, EncodeOptions};
use super::format::{read_metadata, ImageMetadata, OutputFormat, SourceFormat};
use super::watermark::{requires_watermark, WatermarkPolicy};
use crate::error::TransformError;
use crate::object::ImageRequest;

/// Largest width or height the executor will produce.
pub const DEFAULT_MAX_DIMENSION: u32 = 10_000;

/// What the pipeline will produce for a request, decided before any pixel
/// work happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformPlan {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub watermark: bool,
}

/// Encoded result of a transform.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub data: Bytes,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    pub watermarked: bool,
}

impl TransformOutput {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Runs the transform pipeline with fixed codec and watermark settings.
#[derive(Debug, Clone)]
pub struct TransformExecutor {
    options: EncodeOptions,
    watermark: WatermarkPolicy,
    max_dimension: u32,
}

impl Default for TransformExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformExecutor {
    pub fn new() -> Self {
        Self {
            options: EncodeOptions::default(),
            watermark: WatermarkPolicy::default(),
            max_dimension: DEFAULT_MAX_DIMENSION,
        }
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.options = self.options.with_jpeg_quality(quality);
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    pub fn with_watermark_policy(mut self, policy: WatermarkPolicy) -> Self {
        self.watermark = policy;
        self
    }

    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    pub fn max_dimension(&self) -> u32 {
        self.max_dimension
    }

    /// Decide output size, format and watermarking from the source metadata.
    ///
    /// Watermarked images are worked on as PNG, so an unspecified output
    /// format becomes PNG for them.
    pub fn plan(
        &self,
        metadata: &ImageMetadata,
        request: &ImageRequest,
    ) -> Result<TransformPlan, TransformError> {
        let watermark = requires_watermark(&request.object_key, request.watermark_requested);

        let working_format = if watermark {
            SourceFormat::Png
        } else {
            metadata.format.clone()
        };

        let (width, height) = resolve_request_dimensions(metadata.width, metadata.height, request);
        let (width, height) = fill_unspecified(width, height, metadata.width, metadata.height);

        let format = match request.format.as_deref() {
            Some(requested) => OutputFormat::parse(requested)?,
            None => OutputFormat::from_source(&working_format)?,
        };

        if width > self.max_dimension || height > self.max_dimension {
            return Err(TransformError::Process {
                message: format!(
                    "requested size {}x{} exceeds the maximum of {}",
                    width, height, self.max_dimension
                ),
            });
        }

        Ok(TransformPlan {
            width,
            height,
            format,
            watermark,
        })
    }

    /// Run the full pipeline on raw source bytes.
    pub fn transform(
        &self,
        raw: &[u8],
        request: &ImageRequest,
    ) -> Result<TransformOutput, TransformError> {
        let metadata = read_metadata(raw)?;
        let plan = self.plan(&metadata, request)?;

        let mut image = decode(raw)?;
        if plan.watermark {
            image = self.apply_watermark(image, &metadata.format)?;
        }

        let image = resize(image, plan.width, plan.height);
        let data = encode(&image, plan.format, &self.options)?;

        debug!(
            key = %request.object_key,
            source_format = %metadata.format,
            source_width = metadata.width,
            source_height = metadata.height,
            width = plan.width,
            height = plan.height,
            format = plan.format.name(),
            watermark = plan.watermark,
            bytes = data.len(),
            "Transformed image"
        );

        Ok(TransformOutput {
            data,
            format: plan.format,
            width: plan.width,
            height: plan.height,
            watermarked: plan.watermark,
        })
    }

    /// Convert to the PNG working model (RGBA) and composite the mark.
    fn apply_watermark(
        &self,
        image: DynamicImage,
        source_format: &SourceFormat,
    ) -> Result<DynamicImage, TransformError> {
        if *source_format != SourceFormat::Png {
            debug!(from = %source_format, "Converting to PNG before watermarking");
        }
        let mut rgba = image.into_rgba8();
        self.watermark.apply(&mut rgba)?;
        Ok(DynamicImage::ImageRgba8(rgba))
    }
}
