//! Image decoder, resizer and encoder.
//!
//! # Design Decisions
//!
//! - **Always re-encode**: even when no resize or format change is requested
//!   the image is decoded and re-encoded, so output quality settings apply to
//!   every response.
//!
//! - **Exact resize**: the resolved dimensions are applied as-is with a
//!   Lanczos3 filter. Aspect ratio is handled upstream by the resolver.
//!
//! - **Lossless WebP**: the `image` crate only ships a lossless WebP encoder.

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader};

use super::format::OutputFormat;
use crate::error::TransformError;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

/// zlib-style PNG compression level (0-9).
pub const PNG_COMPRESSION_LEVEL: u8 = 8;

// =============================================================================
// Encode Options
// =============================================================================

/// Codec settings applied to every output image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    pub jpeg_quality: u8,
    pub png_compression_level: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            png_compression_level: PNG_COMPRESSION_LEVEL,
        }
    }
}

impl EncodeOptions {
    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY);
        self
    }
}

/// Map a 0-9 compression level onto the encoder's presets.
pub fn png_compression(level: u8) -> CompressionType {
    match level {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

// =============================================================================
// Pipeline Steps
// =============================================================================

/// Decode raw bytes into pixels.
pub fn decode(raw: &[u8]) -> Result<DynamicImage, TransformError> {
    ImageReader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|e| TransformError::Process {
            message: e.to_string(),
        })?
        .decode()
        .map_err(|e| TransformError::Process {
            message: e.to_string(),
        })
}

/// Resize to exactly `width`×`height`. A no-op at the current size.
pub fn resize(image: DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() == width && image.height() == height {
        return image;
    }
    image.resize_exact(width, height, FilterType::Lanczos3)
}

/// Encode pixels into `format`.
pub fn encode(
    image: &DynamicImage,
    format: OutputFormat,
    options: &EncodeOptions,
) -> Result<Bytes, TransformError> {
    let (width, height) = (image.width(), image.height());
    let mut output = Vec::new();

    let result = match format {
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = image.to_rgb8();
            JpegEncoder::new_with_quality(&mut output, options.jpeg_quality).write_image(
                rgb.as_raw(),
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
        OutputFormat::Png => {
            let encoder = PngEncoder::new_with_quality(
                &mut output,
                png_compression(options.png_compression_level),
                PngFilter::Adaptive,
            );
            write_rgb_or_rgba(encoder, image)
        }
        OutputFormat::WebP => write_rgb_or_rgba(WebPEncoder::new_lossless(&mut output), image),
    };

    result.map_err(|e| TransformError::Process {
        message: format!("{} encode failed: {}", format.name(), e),
    })?;

    Ok(Bytes::from(output))
}

fn write_rgb_or_rgba<E: ImageEncoder>(
    encoder: E,
    image: &DynamicImage,
) -> image::ImageResult<()> {
    let (width, height) = (image.width(), image.height());
    if image.color().has_alpha() {
        let rgba = image.to_rgba8();
        encoder.write_image(rgba.as_raw(), width, height, ExtendedColorType::Rgba8)
    } else {
        let rgb = image.to_rgb8();
        encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
    }
}
