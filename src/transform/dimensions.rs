//! Target dimension resolution.
//!
//! Requested sizes arrive as raw query strings. The resolver never fails: a
//! value that is missing, unparsable or not strictly positive falls back to
//! the source dimension.
//!
//! # Aspect Ratio
//!
//! When only one axis is given, the other is scaled with truncating integer
//! arithmetic, `(requested / source) * other`. The division happens first, so
//! the aspect ratio is only preserved when the requested size is an exact
//! multiple of the source size:
//!
//! | Source  | `width` | Result   |
//! |---------|---------|----------|
//! | 100×50  | 200     | 200×100  |
//! | 100×50  | 150     | 150×50   |
//! | 200×100 | 50      | 50×0     |
//!
//! A zero axis is filled in from the source ratio by [`fill_unspecified`]
//! before encoding.

use crate::object::ImageRequest;

/// Resolve `(width, height)` from optional requested sizes.
///
/// An empty string means "not requested". A non-empty string that is not a
/// positive integer falls back to the matching source dimension.
pub fn resolve_dimensions(
    source_width: u32,
    source_height: u32,
    width: &str,
    height: &str,
) -> (u32, u32) {
    match (width.is_empty(), height.is_empty()) {
        (true, true) => (source_width, source_height),
        (false, true) => {
            let w = parse_positive(width).unwrap_or(source_width);
            (w, scale_axis(w, source_width, source_height))
        }
        (true, false) => {
            let h = parse_positive(height).unwrap_or(source_height);
            (scale_axis(h, source_height, source_width), h)
        }
        (false, false) => (
            parse_positive(width).unwrap_or(source_width),
            parse_positive(height).unwrap_or(source_height),
        ),
    }
}

/// Resolve the request's dimensions: `width`/`height` first, then `w`/`h`
/// applied on top so the short forms win.
pub fn resolve_request_dimensions(
    source_width: u32,
    source_height: u32,
    request: &ImageRequest,
) -> (u32, u32) {
    let (w, h) = resolve_dimensions(source_width, source_height, &request.width, &request.height);
    resolve_dimensions(w, h, &request.w, &request.h)
}

/// Replace a zero axis with one derived from the source aspect ratio.
///
/// The result is always strictly positive for a non-empty source.
pub fn fill_unspecified(
    width: u32,
    height: u32,
    source_width: u32,
    source_height: u32,
) -> (u32, u32) {
    match (width, height) {
        (0, 0) => (source_width.max(1), source_height.max(1)),
        (w, 0) => (w, proportional(w, source_width, source_height)),
        (0, h) => (proportional(h, source_height, source_width), h),
        (w, h) => (w, h),
    }
}

/// Parse a strictly positive integer, `None` otherwise.
fn parse_positive(value: &str) -> Option<u32> {
    value
        .parse::<i64>()
        .ok()
        .filter(|v| *v > 0)
        .and_then(|v| u32::try_from(v).ok())
}

/// `(target / source) * other` with integer division first.
fn scale_axis(target: u32, source: u32, other: u32) -> u32 {
    if source == 0 {
        return other;
    }
    let factor = u64::from(target) / u64::from(source);
    (factor * u64::from(other)).min(u64::from(u32::MAX)) as u32
}

/// `target * other / source`, rounded, at least 1.
fn proportional(target: u32, source: u32, other: u32) -> u32 {
    if source == 0 {
        return other.max(1);
    }
    let scaled = (u64::from(target) * u64::from(other) + u64::from(source) / 2) / u64::from(source);
    scaled.clamp(1, u64::from(u32::MAX)) as u32
}
