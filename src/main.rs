//! Image Relay - on-demand image resizing and watermarking proxy.
//!
//! This binary starts the HTTP server and the cache janitor.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use image_relay::{
    config::Config,
    io::HttpOrigin,
    object::ObjectLocator,
    server::{create_shared_router, RouterConfig},
    transform::{CacheMode, ImageService, TransformExecutor},
};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    info!("Image Relay v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  Origin: {}", config.origin_base_url);
    info!("  Staging root: {}", config.staging_root);
    info!("  Production root: {}", config.production_root);
    match config.origin_timeout() {
        Some(timeout) => info!("  Origin timeout: {}s", timeout.as_secs()),
        None => info!("  Origin timeout: none"),
    }
    info!(
        "  Output: JPEG quality {}, max dimension {}",
        config.jpeg_quality, config.max_output_dimension
    );

    let origin = match HttpOrigin::new(config.origin_timeout()) {
        Ok(origin) => origin,
        Err(e) => {
            error!("Failed to create origin client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let executor = TransformExecutor::new()
        .with_jpeg_quality(config.jpeg_quality)
        .with_max_dimension(config.max_output_dimension);

    let service = Arc::new(ImageService::with_executor(
        ObjectLocator::new(config.locator_settings()),
        Arc::new(origin),
        config.cache_mode,
        executor,
    ));

    match config.cache_mode {
        CacheMode::Disk => {
            if let Some(janitor) = service.janitor(config.janitor_interval()) {
                info!(
                    "  Cache: disk, purged every {}s",
                    janitor.interval().as_secs()
                );
                janitor.spawn();
            }
        }
        CacheMode::None => {
            warn!("  Cache: DISABLED - every request fetches from the origin");
        }
    }

    let router = create_shared_router(service, build_router_config(&config));

    let addr = config.bind_address();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            return ExitCode::FAILURE;
        }
    };

    info!("Server listening on: http://{}", addr);
    info!("  curl http://{}/health", addr);
    info!("  curl -o out.webp 'http://{}/production/<key>?w=300&format=webp'", addr);

    if let Err(e) = axum::serve(listener, router).await {
        error!("Server error: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "image_relay=debug,tower_http=debug"
    } else {
        "image_relay=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build RouterConfig from the application Config.
fn build_router_config(config: &Config) -> RouterConfig {
    let mut router_config = RouterConfig::new()
        .with_cache_max_age(config.cache_max_age)
        .with_tracing(!config.no_tracing);

    if let Some(ref origins) = config.cors_origins {
        router_config = router_config.with_cors_origins(origins.clone());
    }

    if let Some(ref path) = config.favicon_path {
        router_config = router_config.with_favicon(path.clone());
    }

    router_config
}
