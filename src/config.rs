//! Configuration management for the image proxy.
//!
//! Settings come from command-line arguments or `RELAY_`-prefixed
//! environment variables, with defaults for everything except the two bucket
//! roots.
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use image_relay::config::Config;
//!
//! let config = Config::parse();
//! config.validate()?;
//! println!("Listening on {}", config.bind_address());
//! ```
//!
//! # Environment Variables
//!
//! - `RELAY_HOST` - Server bind address (default: 0.0.0.0)
//! - `RELAY_PORT` - Server port (default: 8080)
//! - `RELAY_ORIGIN_BASE_URL` - Origin base URL (default: https://images.baleomol.com/)
//! - `RELAY_STAGING_ROOT` - Physical root for the `staging` alias (required)
//! - `RELAY_PRODUCTION_ROOT` - Physical root for the `production` alias (required)
//! - `RELAY_CACHE_MODE` - `disk` or `none` (default: disk)
//! - `RELAY_JANITOR_INTERVAL_SECS` - Cache purge period (default: one week)
//! - `RELAY_JPEG_QUALITY` - JPEG output quality (default: 80)
//! - `RELAY_MAX_OUTPUT_DIMENSION` - Largest output width/height (default: 10000)
//! - `RELAY_ORIGIN_TIMEOUT_SECS` - Origin request timeout, 0 = none (default: 0)
//! - `RELAY_CACHE_MAX_AGE` - HTTP cache max-age seconds (default: 3600)
//! - `RELAY_FAVICON_PATH` - File served at /favicon.ico
//! - `RELAY_CORS_ORIGINS` - Comma-separated allowed origins

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::cache::DEFAULT_SWEEP_INTERVAL;
use crate::object::LocatorSettings;
use crate::transform::{CacheMode, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_DIMENSION};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default origin base URL.
pub const DEFAULT_ORIGIN_BASE_URL: &str = "https://images.baleomol.com/";

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Image Relay - on-demand image resizing and watermarking proxy.
///
/// Fetches images from an origin, keeps a local copy, and serves resized,
/// re-encoded and optionally watermarked variants.
#[derive(Parser, Debug, Clone)]
#[command(name = "image-relay")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "RELAY_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "RELAY_PORT")]
    pub port: u16,

    // =========================================================================
    // Origin Configuration
    // =========================================================================
    /// Base URL objects are fetched from. Must end with `/`.
    #[arg(long, default_value = DEFAULT_ORIGIN_BASE_URL, env = "RELAY_ORIGIN_BASE_URL")]
    pub origin_base_url: String,

    /// Origin request timeout in seconds (0 = no timeout).
    #[arg(long, default_value_t = 0, env = "RELAY_ORIGIN_TIMEOUT_SECS")]
    pub origin_timeout_secs: u64,

    // =========================================================================
    // Bucket Configuration
    // =========================================================================
    /// Physical root for the `staging` alias (local directory and origin prefix).
    #[arg(long, env = "RELAY_STAGING_ROOT")]
    pub staging_root: String,

    /// Physical root for the `production` alias (local directory and origin prefix).
    #[arg(long, env = "RELAY_PRODUCTION_ROOT")]
    pub production_root: String,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Where fetched source images are kept.
    #[arg(long, value_enum, default_value_t = CacheMode::Disk, env = "RELAY_CACHE_MODE")]
    pub cache_mode: CacheMode,

    /// Seconds between cache purges.
    #[arg(
        long,
        default_value_t = DEFAULT_SWEEP_INTERVAL.as_secs(),
        env = "RELAY_JANITOR_INTERVAL_SECS"
    )]
    pub janitor_interval_secs: u64,

    /// HTTP Cache-Control max-age in seconds.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "RELAY_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // Transform Configuration
    // =========================================================================
    /// JPEG output quality (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "RELAY_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// Largest width or height an output image may have.
    #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION, env = "RELAY_MAX_OUTPUT_DIMENSION")]
    pub max_output_dimension: u32,

    // =========================================================================
    // HTTP Configuration
    // =========================================================================
    /// File served at `/favicon.ico`.
    #[arg(long, env = "RELAY_FAVICON_PATH")]
    pub favicon_path: Option<PathBuf>,

    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "RELAY_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        let base = url::Url::parse(&self.origin_base_url)
            .map_err(|e| format!("origin_base_url is not a valid URL: {}", e))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err("origin_base_url must use http or https".to_string());
        }
        if !self.origin_base_url.ends_with('/') {
            return Err("origin_base_url must end with '/'".to_string());
        }

        for (name, root) in [
            ("staging_root", &self.staging_root),
            ("production_root", &self.production_root),
        ] {
            if root.is_empty() {
                return Err(format!(
                    "{} is required. Set --{} or RELAY_{}",
                    name,
                    name.replace('_', "-"),
                    name.to_uppercase()
                ));
            }
            if root.split('/').any(|segment| segment == "..") {
                return Err(format!("{} must not contain '..'", name));
            }
        }

        if self.staging_root == self.production_root {
            return Err("staging_root and production_root must differ".to_string());
        }

        if self.janitor_interval_secs == 0 {
            return Err("janitor_interval_secs must be greater than 0".to_string());
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        if self.max_output_dimension == 0 {
            return Err("max_output_dimension must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Locator settings derived from this configuration.
    pub fn locator_settings(&self) -> LocatorSettings {
        LocatorSettings::new(
            self.origin_base_url.clone(),
            self.staging_root.clone(),
            self.production_root.clone(),
        )
    }

    pub fn janitor_interval(&self) -> Duration {
        Duration::from_secs(self.janitor_interval_secs)
    }

    /// Origin timeout, `None` when disabled.
    pub fn origin_timeout(&self) -> Option<Duration> {
        (self.origin_timeout_secs > 0).then(|| Duration::from_secs(self.origin_timeout_secs))
    }
}

// =============================================================================
// Tests
// =============================================================================
