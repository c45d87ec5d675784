//! Request addressing.
//!
//! Turns an inbound path and query string into the two values the rest of the
//! pipeline works with:
//!
//! - [`ResolvedLocation`]: local cache path and origin URL for the object
//! - [`ImageRequest`]: the transform parameters for this request
//!
//! ```text
//!   GET /staging/uploads/a.jpg?w=300
//!          │
//!          ▼
//!   ┌──────────────┐     ┌──────────────────────────────────────────┐
//!   │ ObjectLocator│ ──▶ │ local:  {staging_root}/uploads/a.jpg     │
//!   └──────────────┘     │ origin: {base}{staging_root}/uploads/a.jpg│
//!                        └──────────────────────────────────────────┘
//! ```

mod locator;
mod request;

pub use locator::{
    split_request_path, LocatorSettings, ObjectLocator, ResolvedLocation, PRODUCTION_ALIAS,
    STAGING_ALIAS,
};
pub use request::{ImageQuery, ImageRequest};
