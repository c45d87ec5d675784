//! Text watermark rendering and compositing.
//!
//! The mark is a short line of dark text on a white swatch, rendered from an
//! 8×8 bitmap font, scaled up to a fixed physical width and made partially
//! transparent. It is tiled across the image:
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │  margin                              │
//! │   ┌──────┐ margin ┌──────┐           │
//! │   │ mark │        │ mark │           │
//! │   └──────┘        └──────┘           │
//! │   ┌──────┐        ┌──────┐           │
//! │   │ mark │        │ mark │           │
//! │   └──────┘        └──────┘           │
//! └──────────────────────────────────────┘
//! ```
//!
//! Images too small for a single tile get one mark, shrunk to fit and
//! centered.

use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::error::TransformError;

/// Text drawn by the default policy.
pub const WATERMARK_TEXT: &str = "Baleomol.com";

/// Object keys containing this segment are always watermarked.
pub const PROTECTED_KEY_SEGMENT: &str = "uploads/charge_submission";

/// Mark opacity (0.0-1.0).
pub const WATERMARK_OPACITY: f32 = 0.8;

/// Mark width in points.
pub const WATERMARK_WIDTH_POINTS: u32 = 120;

/// Resolution used to convert points to pixels.
pub const WATERMARK_DPI: u32 = 150;

/// Gap between tiles and around the tiled area, in pixels.
pub const WATERMARK_MARGIN: u32 = 100;

const GLYPH_SIZE: u32 = 8;
// Glyph width plus one column for the bold stroke
const GLYPH_ADVANCE: u32 = GLYPH_SIZE + 1;
const SWATCH_PADDING: u32 = 2;

/// Whether an object must be watermarked.
pub fn requires_watermark(object_key: &str, requested: bool) -> bool {
    requested || object_key.contains(PROTECTED_KEY_SEGMENT)
}

/// How the watermark looks and is placed.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkPolicy {
    pub text: String,
    pub opacity: f32,
    pub width_points: u32,
    pub dpi: u32,
    pub margin: u32,
    pub foreground: Rgba<u8>,
    pub background: Rgba<u8>,
}

impl Default for WatermarkPolicy {
    fn default() -> Self {
        Self {
            text: WATERMARK_TEXT.to_string(),
            opacity: WATERMARK_OPACITY,
            width_points: WATERMARK_WIDTH_POINTS,
            dpi: WATERMARK_DPI,
            margin: WATERMARK_MARGIN,
            foreground: Rgba([0x1a, 0x1a, 0x1a, 0xff]),
            background: Rgba([0xff, 0xff, 0xff, 0xff]),
        }
    }
}

impl WatermarkPolicy {
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Mark width in pixels.
    pub fn mark_width_px(&self) -> u32 {
        self.width_points * self.dpi / 72
    }

    /// Render the scaled, translucent mark.
    pub fn render_mark(&self) -> Result<RgbaImage, TransformError> {
        if !(self.opacity > 0.0 && self.opacity <= 1.0) {
            return Err(watermark_error(format!(
                "opacity must be in (0, 1], got {}",
                self.opacity
            )));
        }

        let target_width = self.mark_width_px();
        if target_width == 0 {
            return Err(watermark_error("mark width is zero"));
        }

        let text = self.render_text()?;
        let target_height =
            ((u64::from(text.height()) * u64::from(target_width)) / u64::from(text.width())).max(1) as u32;

        let mut mark = imageops::resize(&text, target_width, target_height, FilterType::Nearest);
        for pixel in mark.pixels_mut() {
            pixel[3] = (f32::from(pixel[3]) * self.opacity).round() as u8;
        }

        Ok(mark)
    }

    /// Composite the mark onto `image` in place.
    pub fn apply(&self, image: &mut RgbaImage) -> Result<(), TransformError> {
        let mark = self.render_mark()?;
        let (width, height) = image.dimensions();

        let positions = tile_positions(width, height, mark.width(), mark.height(), self.margin);
        if positions.is_empty() {
            let mark = fit_within(mark, width, height);
            let x = (width - mark.width()) / 2;
            let y = (height - mark.height()) / 2;
            imageops::overlay(image, &mark, i64::from(x), i64::from(y));
            return Ok(());
        }

        for (x, y) in positions {
            imageops::overlay(image, &mark, i64::from(x), i64::from(y));
        }
        Ok(())
    }

    /// Draw the text at 1:1 scale. Strokes are doubled horizontally.
    fn render_text(&self) -> Result<RgbaImage, TransformError> {
        let glyphs = self
            .text
            .chars()
            .map(|c| {
                BASIC_FONTS
                    .get(c)
                    .ok_or_else(|| watermark_error(format!("no glyph for {:?}", c)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        if glyphs.is_empty() {
            return Err(watermark_error("watermark text is empty"));
        }

        let width = glyphs.len() as u32 * GLYPH_ADVANCE + 1 + 2 * SWATCH_PADDING;
        let height = GLYPH_SIZE + 2 * SWATCH_PADDING;
        let mut canvas = RgbaImage::from_pixel(width, height, self.background);

        for (index, rows) in glyphs.iter().enumerate() {
            let origin_x = SWATCH_PADDING + index as u32 * GLYPH_ADVANCE;
            for (row, bits) in rows.iter().enumerate() {
                let y = SWATCH_PADDING + row as u32;
                for col in 0..GLYPH_SIZE {
                    // Bit 0 is the leftmost pixel
                    if (bits >> col) & 1 == 1 {
                        let x = origin_x + col;
                        canvas.put_pixel(x, y, self.foreground);
                        canvas.put_pixel(x + 1, y, self.foreground);
                    }
                }
            }
        }

        Ok(canvas)
    }
}

/// Top-left corners of every tile that fits entirely inside the image.
fn tile_positions(
    width: u32,
    height: u32,
    mark_width: u32,
    mark_height: u32,
    margin: u32,
) -> Vec<(u32, u32)> {
    let xs = axis_positions(width, mark_width, margin);
    let ys = axis_positions(height, mark_height, margin);

    ys.iter()
        .flat_map(|&y| xs.iter().map(move |&x| (x, y)))
        .collect()
}

fn axis_positions(extent: u32, size: u32, margin: u32) -> Vec<u32> {
    let (extent, size, margin) = (u64::from(extent), u64::from(size), u64::from(margin));
    let mut positions = Vec::new();
    let mut pos = margin;
    while pos + size <= extent {
        positions.push(pos as u32);
        pos += size + margin;
    }
    positions
}

/// Shrink `mark` to fit inside `width`×`height`, keeping its ratio.
fn fit_within(mark: RgbaImage, width: u32, height: u32) -> RgbaImage {
    if mark.width() <= width && mark.height() <= height {
        return mark;
    }
    let factor = (f64::from(width) / f64::from(mark.width()))
        .min(f64::from(height) / f64::from(mark.height()));
    let new_width = ((f64::from(mark.width()) * factor).floor() as u32).clamp(1, width.max(1));
    let new_height = ((f64::from(mark.height()) * factor).floor() as u32).clamp(1, height.max(1));
    imageops::resize(&mark, new_width, new_height, FilterType::Nearest)
}

fn watermark_error(message: impl Into<String>) -> TransformError {
    TransformError::Watermark {
        message: message.into(),
    }
}
