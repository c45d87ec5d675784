//! API integration tests for image retrieval and error handling.
//!
//! Tests verify:
//! - Resizing and format conversion through the HTTP layer
//! - Error cases (malformed path, missing object, unsupported format)
//! - HTTP response codes and headers
//! - Health and favicon endpoints

use axum::http::StatusCode;
use image::ImageFormat;

use image_relay::server::RouterConfig;
use image_relay::transform::CacheMode;

use super::test_utils::{
    create_png, create_solid, decode_dimensions, detect_format, get, header, TestEnv,
};

// =============================================================================
// Image Retrieval
// =============================================================================

#[tokio::test]
async fn test_resize_and_convert_to_webp() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/production/img/pic.png", create_png(200, 100));

    let (status, headers, body) =
        get(env.router(), "/production/img/pic.png?w=50&format=webp").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "content-type"), "image/webp");
    assert_eq!(header(&headers, "cache-control"), "public, max-age=3600");
    assert_eq!(header(&headers, "x-cache-status"), "miss");
    assert_eq!(detect_format(&body), ImageFormat::WebP);
    assert_eq!(decode_dimensions(&body), (50, 25));
}

#[tokio::test]
async fn test_no_params_returns_source_size_and_format() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/staging/a/b/c.jpg", create_solid(64, 48, ImageFormat::Jpeg));

    let (status, headers, body) = get(env.router(), "/staging/a/b/c.jpg").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "content-type"), "image/jpeg");
    assert_eq!(decode_dimensions(&body), (64, 48));
}

#[tokio::test]
async fn test_height_only_scales_width() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/production/h.png", create_png(200, 100));

    let (status, _, body) = get(env.router(), "/production/h.png?height=200").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode_dimensions(&body), (400, 200));
}

#[tokio::test]
async fn test_both_dimensions_taken_literally() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/production/both.png", create_png(200, 100));

    let (status, _, body) = get(env.router(), "/production/both.png?width=30&height=70").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode_dimensions(&body), (30, 70));
}

#[tokio::test]
async fn test_short_form_wins() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/production/s.png", create_png(200, 100));

    let (status, _, body) =
        get(env.router(), "/production/s.png?width=100&height=100&w=20&h=10").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode_dimensions(&body), (20, 10));
}

#[tokio::test]
async fn test_invalid_width_falls_back_to_source() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/production/bad.png", create_png(120, 80));

    let (status, _, body) = get(env.router(), "/production/bad.png?width=abc").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode_dimensions(&body), (120, 80));
}

#[tokio::test]
async fn test_format_case_insensitive() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/production/f.png", create_png(20, 20));

    let (status, headers, body) = get(env.router(), "/production/f.png?format=JPG").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "content-type"), "image/jpeg");
    assert_eq!(detect_format(&body), ImageFormat::Jpeg);
}

#[tokio::test]
async fn test_percent_encoded_key() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/production/img/my pic.png", create_png(10, 10));

    let (status, _, _) = get(env.router(), "/production/img/my%20pic.png").await;

    assert_eq!(status, StatusCode::OK);
    assert!(env.local_path("/production/img/my pic.png").is_file());
}

#[tokio::test]
async fn test_unknown_alias_used_verbatim() {
    let env = TestEnv::new(CacheMode::None);
    env.add_object("/archive/old.png", create_png(10, 10));

    let (status, headers, _) = get(env.router(), "/archive/old.png").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "x-cache-status"), "bypass");
}

#[tokio::test]
async fn test_custom_cache_max_age() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/production/m.png", create_png(10, 10));

    let router = env.router_with(RouterConfig::new().with_cache_max_age(60));
    let (_, headers, _) = get(router, "/production/m.png").await;

    assert_eq!(header(&headers, "cache-control"), "public, max-age=60");
}

// =============================================================================
// Error Handling
// =============================================================================

#[tokio::test]
async fn test_missing_key_is_bad_request() {
    let env = TestEnv::new(CacheMode::Disk);

    let (status, headers, body) = get(env.router(), "/staging").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(header(&headers, "content-type").starts_with("text/plain"));
    assert!(String::from_utf8_lossy(&body).starts_with("Bad request"));
    assert_eq!(env.origin.open_count(), 0);
}

#[tokio::test]
async fn test_trailing_slash_is_bad_request() {
    let env = TestEnv::new(CacheMode::Disk);

    let (status, _, _) = get(env.router(), "/staging/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_root_is_bad_request() {
    let env = TestEnv::new(CacheMode::Disk);

    let (status, _, _) = get(env.router(), "/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_traversal_is_bad_request() {
    let env = TestEnv::new(CacheMode::Disk);

    let (status, _, _) = get(env.router(), "/staging/%2e%2e/%2e%2e/secret.png").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(env.origin.open_count(), 0);
}

#[tokio::test]
async fn test_origin_missing_is_not_found() {
    let env = TestEnv::new(CacheMode::Disk);

    let (status, _, body) = get(env.router(), "/production/nope.png").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(String::from_utf8_lossy(&body).contains("nope.png"));
    assert!(!env.local_path("/production/nope.png").exists());
}

#[tokio::test]
async fn test_unsupported_format_is_server_error() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/production/g.png", create_png(10, 10));

    let (status, _, body) = get(env.router(), "/production/g.png?format=gif").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(String::from_utf8_lossy(&body), "Unsupported image format: gif");
}

#[tokio::test]
async fn test_corrupt_source_is_server_error() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/production/corrupt.png", b"this is not an image".to_vec());

    let (status, _, body) = get(env.router(), "/production/corrupt.png").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(String::from_utf8_lossy(&body).contains("metadata"));
}

// =============================================================================
// Health and Favicon
// =============================================================================

#[tokio::test]
async fn test_health() {
    let env = TestEnv::new(CacheMode::Disk);

    let (status, _, body) = get(env.router(), "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_favicon_served_from_disk() {
    let env = TestEnv::new(CacheMode::Disk);
    let icon = env.dir.path().join("favicon.ico");
    std::fs::write(&icon, b"\x00\x00\x01\x00icon").unwrap();

    let router = env.router_with(RouterConfig::new().with_favicon(&icon));
    let (status, headers, body) = get(router, "/favicon.ico").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "content-type"), "image/x-icon");
    assert_eq!(&body[..], b"\x00\x00\x01\x00icon");
    assert_eq!(env.origin.open_count(), 0);
}

#[tokio::test]
async fn test_favicon_missing() {
    let env = TestEnv::new(CacheMode::Disk);

    let (status, _, _) = get(env.router(), "/favicon.ico").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let router = env.router_with(
        RouterConfig::new().with_favicon(env.dir.path().join("does-not-exist.ico")),
    );
    let (status, _, _) = get(router, "/favicon.ico").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
