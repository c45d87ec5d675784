//! HTTP server layer for the image proxy.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         HTTP Layer                              │
//! │        GET /{bucket}/{key...}?w=&h=&format=&watermark=          │
//! │                                                                 │
//! │  ┌──────────────────────────┐  ┌─────────────────────────────┐  │
//! │  │        handlers          │  │          routes             │  │
//! │  │ (image, favicon, health) │  │ (router, CORS, tracing)     │  │
//! │  └──────────────────────────┘  └─────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod handlers;
pub mod routes;

pub use handlers::{
    favicon_handler, health_handler, image_handler, AppState, HealthResponse, CACHE_STATUS_HEADER,
};
pub use routes::{create_router, create_shared_router, RouterConfig};
