//! Object locator.
//!
//! Maps an inbound request path such as `/staging/uploads/a.jpg` to a
//! [`ResolvedLocation`]: the physical bucket root, the object key, the local
//! cache path and the origin URL.
//!
//! # Bucket Aliases
//!
//! The first path segment is a bucket alias. Two symbolic aliases are known,
//! compared case-insensitively:
//!
//! | Alias        | Physical root                       |
//! |--------------|-------------------------------------|
//! | `staging`    | [`LocatorSettings::staging_root`]    |
//! | `production` | [`LocatorSettings::production_root`] |
//!
//! Any other alias is used verbatim as the physical root.

use crate::error::ProxyError;

/// Symbolic alias for the staging bucket.
pub const STAGING_ALIAS: &str = "staging";

/// Symbolic alias for the production bucket.
pub const PRODUCTION_ALIAS: &str = "production";

// =============================================================================
// Settings
// =============================================================================

/// Process-wide settings the locator derives locations from.
///
/// Built once at startup from [`crate::Config`] and handed to the locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorSettings {
    /// Base URL of the origin, e.g. `https://images.example.com/`
    pub origin_base_url: String,

    /// Physical root for the `staging` alias
    pub staging_root: String,

    /// Physical root for the `production` alias
    pub production_root: String,
}

impl LocatorSettings {
    pub fn new(
        origin_base_url: impl Into<String>,
        staging_root: impl Into<String>,
        production_root: impl Into<String>,
    ) -> Self {
        Self {
            origin_base_url: origin_base_url.into(),
            staging_root: staging_root.into(),
            production_root: production_root.into(),
        }
    }
}

// =============================================================================
// Resolved Location
// =============================================================================

/// Where an object lives locally and at the origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLocation {
    /// Alias as it appeared in the request path
    pub bucket_alias: String,

    /// Physical bucket root the alias maps to
    pub bucket_root: String,

    /// Object key within the bucket
    pub object_key: String,

    /// Local cache path: `{bucket_root}/{object_key}`
    pub local_path: String,

    /// Origin URL: `{origin_base_url}{bucket_root}/{object_key}`
    pub origin_url: String,
}

// =============================================================================
// Object Locator
// =============================================================================

/// Resolves request paths against the configured bucket roots.
#[derive(Debug, Clone)]
pub struct ObjectLocator {
    settings: LocatorSettings,
}

impl ObjectLocator {
    pub fn new(settings: LocatorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &LocatorSettings {
        &self.settings
    }

    /// Physical roots of the symbolic buckets, in `[staging, production]` order.
    pub fn bucket_roots(&self) -> [&str; 2] {
        [&self.settings.staging_root, &self.settings.production_root]
    }

    /// Resolve a request path to a location.
    ///
    /// # Errors
    ///
    /// Returns [`ProxyError::BadRequest`] when the path does not contain both a
    /// bucket alias and a non-empty object key, when it is not valid
    /// percent-encoded UTF-8, or when the key contains `.`/`..` segments.
    pub fn locate(&self, request_path: &str) -> Result<ResolvedLocation, ProxyError> {
        let (alias, key) = split_request_path(request_path)?;
        Ok(self.resolve(&alias, &key))
    }

    /// Build the location for an already split alias and key.
    pub fn resolve(&self, bucket_alias: &str, object_key: &str) -> ResolvedLocation {
        let bucket_root = self.physical_root(bucket_alias).to_string();
        let local_path = format!("{}/{}", bucket_root, object_key);
        let origin_url = format!(
            "{}{}/{}",
            self.settings.origin_base_url, bucket_root, object_key
        );

        ResolvedLocation {
            bucket_alias: bucket_alias.to_string(),
            bucket_root,
            object_key: object_key.to_string(),
            local_path,
            origin_url,
        }
    }

    /// Map an alias to its physical root, passing unknown aliases through.
    pub fn physical_root<'a>(&'a self, bucket_alias: &'a str) -> &'a str {
        if bucket_alias.eq_ignore_ascii_case(STAGING_ALIAS) {
            &self.settings.staging_root
        } else if bucket_alias.eq_ignore_ascii_case(PRODUCTION_ALIAS) {
            &self.settings.production_root
        } else {
            bucket_alias
        }
    }

    /// `true` for aliases outside the symbolic set. Their objects land under
    /// a root the janitor does not sweep.
    pub fn is_pass_through(&self, bucket_alias: &str) -> bool {
        !bucket_alias.eq_ignore_ascii_case(STAGING_ALIAS)
            && !bucket_alias.eq_ignore_ascii_case(PRODUCTION_ALIAS)
    }
}

/// Split a request path into `(bucket_alias, object_key)`.
///
/// The path is percent-decoded first, then split on `/`. The first segment is
/// the alias and the remaining segments, re-joined with `/`, form the key.
pub fn split_request_path(request_path: &str) -> Result<(String, String), ProxyError> {
    let decoded = urlencoding::decode(request_path)
        .map_err(|_| ProxyError::bad_request("Image path is not valid UTF-8"))?;
    let trimmed = decoded.strip_prefix('/').unwrap_or(&decoded);

    let mut segments = trimmed.split('/');
    let alias = segments.next().unwrap_or_default();
    let rest: Vec<&str> = segments.collect();

    if alias.is_empty() || rest.is_empty() {
        return Err(ProxyError::bad_request("Image path is required"));
    }

    let key = rest.join("/");
    if key.is_empty() {
        return Err(ProxyError::bad_request("Image path is required"));
    }

    let is_relative = |s: &str| s == "." || s == "..";
    if is_relative(alias) || rest.iter().any(|s| is_relative(s)) {
        return Err(ProxyError::bad_request(format!(
            "Image path must not contain relative segments: {}",
            key
        )));
    }

    Ok((alias.to_string(), key))
}

// =============================================================================
// Tests
// =============================================================================
