use std::fmt;
use std::io::Cursor;

use image::{ImageFormat, ImageReader};

use crate::error::TransformError;

/// Format detected in the source bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFormat {
    Jpeg,
    Png,
    WebP,
    /// Recognized but not encodable; holds the format's usual extension
    Other(String),
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Jpeg => f.write_str("jpeg"),
            SourceFormat::Png => f.write_str("png"),
            SourceFormat::WebP => f.write_str("webp"),
            SourceFormat::Other(name) => f.write_str(name),
        }
    }
}

impl From<ImageFormat> for SourceFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => SourceFormat::Jpeg,
            ImageFormat::Png => SourceFormat::Png,
            ImageFormat::WebP => SourceFormat::WebP,
            other => SourceFormat::Other(
                other
                    .extensions_str()
                    .first()
                    .copied()
                    .unwrap_or("unknown")
                    .to_string(),
            ),
        }
    }
}

/// Encodable output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// Parse a `format` query value (case-insensitive, `jpg` accepted).
    pub fn parse(value: &str) -> Result<Self, TransformError> {
        match value.to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
            "png" => Ok(OutputFormat::Png),
            "webp" => Ok(OutputFormat::WebP),
            _ => Err(TransformError::UnsupportedFormat {
                format: value.to_string(),
            }),
        }
    }

    /// Map a detected source format to an output format.
    pub fn from_source(format: &SourceFormat) -> Result<Self, TransformError> {
        match format {
            SourceFormat::Jpeg => Ok(OutputFormat::Jpeg),
            SourceFormat::Png => Ok(OutputFormat::Png),
            SourceFormat::WebP => Ok(OutputFormat::WebP),
            SourceFormat::Other(name) => Err(TransformError::UnsupportedFormat {
                format: name.clone(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }

    /// `image/<name>`
    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }
}

impl From<OutputFormat> for SourceFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Jpeg => SourceFormat::Jpeg,
            OutputFormat::Png => SourceFormat::Png,
            OutputFormat::WebP => SourceFormat::WebP,
        }
    }
}

/// Dimensions and format read from raw image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
    pub format: SourceFormat,
}

/// Read metadata from the image header without decoding pixels.
pub fn read_metadata(raw: &[u8]) -> Result<ImageMetadata, TransformError> {
    let reader = ImageReader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|e| TransformError::Metadata {
            message: e.to_string(),
        })?;

    let format = reader
        .format()
        .map(SourceFormat::from)
        .ok_or_else(|| TransformError::Metadata {
            message: "unrecognized image format".to_string(),
        })?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| TransformError::Metadata {
            message: e.to_string(),
        })?;

    if width == 0 || height == 0 {
        return Err(TransformError::Metadata {
            message: format!("image has empty dimensions {}x{}", width, height),
        });
    }

    Ok(ImageMetadata {
        width,
        height,
        format,
    })
}
