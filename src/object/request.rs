use serde::Deserialize;

use super::locator::ResolvedLocation;

/// Query parameters accepted on image requests.
///
/// Every field is kept as the raw string: dimensions are interpreted by the
/// dimension resolver (which falls back on bad input) and the format is
/// validated only when the output codec is chosen.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageQuery {
    /// Target width (long form)
    #[serde(default)]
    pub width: Option<String>,

    /// Target height (long form)
    #[serde(default)]
    pub height: Option<String>,

    /// Target width (short form, takes precedence over `width`)
    #[serde(default)]
    pub w: Option<String>,

    /// Target height (short form, takes precedence over `height`)
    #[serde(default)]
    pub h: Option<String>,

    /// Output format: `jpeg`, `png` or `webp`
    #[serde(default)]
    pub format: Option<String>,

    /// `"true"` forces a watermark
    #[serde(default)]
    pub watermark: Option<String>,
}

/// A single inbound image request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequest {
    pub bucket_alias: String,
    pub object_key: String,
    pub width: String,
    pub height: String,
    pub w: String,
    pub h: String,
    pub format: Option<String>,
    pub watermark_requested: bool,
}

impl ImageRequest {
    /// Build a request for an object key with no transform parameters.
    pub fn new(bucket_alias: impl Into<String>, object_key: impl Into<String>) -> Self {
        Self {
            bucket_alias: bucket_alias.into(),
            object_key: object_key.into(),
            width: String::new(),
            height: String::new(),
            w: String::new(),
            h: String::new(),
            format: None,
            watermark_requested: false,
        }
    }

    /// Build a request from a resolved location and its query string.
    pub fn from_query(location: &ResolvedLocation, query: ImageQuery) -> Self {
        Self {
            bucket_alias: location.bucket_alias.clone(),
            object_key: location.object_key.clone(),
            width: query.width.unwrap_or_default(),
            height: query.height.unwrap_or_default(),
            w: query.w.unwrap_or_default(),
            h: query.h.unwrap_or_default(),
            format: query.format.filter(|f| !f.is_empty()),
            watermark_requested: query.watermark.as_deref() == Some("true"),
        }
    }

    pub fn with_size(mut self, width: impl Into<String>, height: impl Into<String>) -> Self {
        self.width = width.into();
        self.height = height.into();
        self
    }

    pub fn with_short_size(mut self, w: impl Into<String>, h: impl Into<String>) -> Self {
        self.w = w.into();
        self.h = h.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_watermark(mut self, requested: bool) -> Self {
        self.watermark_requested = requested;
        self
    }
}
