//! Local cache integration tests.
//!
//! Tests verify:
//! - First request fetches and persists, later requests are served locally
//! - Pre-existing files never touch the origin
//! - Bypass mode always fetches and writes nothing
//! - Concurrent misses collapse into one origin fetch, including requests
//!   arriving while the body is still downloading
//! - A janitor sweep forces the next request back to the origin

use std::time::Duration;

use axum::http::StatusCode;
use image::ImageFormat;

use image_relay::transform::CacheMode;

use super::test_utils::{
    create_png, create_solid, decode_dimensions, get, header, MockOrigin, TestEnv,
};

// =============================================================================
// Hits and Misses
// =============================================================================

#[tokio::test]
async fn test_second_request_is_hit() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/production/img/pic.png", create_png(40, 20));

    let (status, headers, _) = get(env.router(), "/production/img/pic.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "x-cache-status"), "miss");
    assert!(env.local_path("/production/img/pic.png").is_file());

    let (status, headers, _) = get(env.router(), "/production/img/pic.png?w=80").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "x-cache-status"), "hit");

    assert_eq!(env.origin.open_count(), 1);
}

#[tokio::test]
async fn test_existing_file_skips_origin() {
    let env = TestEnv::new(CacheMode::Disk);
    let local = env.local_path("/staging/uploads/a.jpg");
    std::fs::create_dir_all(local.parent().unwrap()).unwrap();
    std::fs::write(&local, create_solid(30, 30, ImageFormat::Jpeg)).unwrap();

    let (status, headers, _) = get(env.router(), "/staging/uploads/a.jpg").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "x-cache-status"), "hit");
    assert_eq!(env.origin.open_count(), 0);
}

#[tokio::test]
async fn test_empty_file_is_refetched() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/staging/empty.png", create_png(10, 10));

    let local = env.local_path("/staging/empty.png");
    std::fs::create_dir_all(local.parent().unwrap()).unwrap();
    std::fs::write(&local, b"").unwrap();

    let (status, headers, _) = get(env.router(), "/staging/empty.png").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "x-cache-status"), "miss");
    assert_eq!(env.origin.open_count(), 1);
    assert!(std::fs::metadata(&local).unwrap().len() > 0);
}

// =============================================================================
// Bypass Mode
// =============================================================================

#[tokio::test]
async fn test_bypass_mode_always_fetches() {
    let env = TestEnv::new(CacheMode::None);
    env.add_object("/production/img/pic.png", create_png(40, 20));

    for _ in 0..3 {
        let (status, headers, _) = get(env.router(), "/production/img/pic.png").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(header(&headers, "x-cache-status"), "bypass");
    }

    assert_eq!(env.origin.open_count(), 3);
    assert!(!env.local_path("/production/img/pic.png").exists());
}

#[tokio::test]
async fn test_bypass_mode_missing_object() {
    let env = TestEnv::new(CacheMode::None);

    let (status, _, _) = get(env.router(), "/production/missing.png").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Concurrency
// =============================================================================

#[tokio::test]
async fn test_concurrent_misses_fetch_once() {
    let origin = MockOrigin::new().with_delay(Duration::from_millis(100));
    let env = TestEnv::with_origin(origin, CacheMode::Disk);
    env.add_object("/production/hot.png", create_png(50, 50));

    let mut handles = Vec::new();
    for i in 0..8 {
        let router = env.router();
        let uri = format!("/production/hot.png?w={}", 10 + i);
        handles.push(tokio::spawn(async move { get(router, &uri).await }));
    }

    for handle in handles {
        let (status, _, _) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(env.origin.open_count(), 1);
}

#[tokio::test]
async fn test_request_arriving_mid_download_gets_whole_image() {
    let origin = MockOrigin::new().with_chunk_delay(Duration::from_millis(300));
    let env = TestEnv::with_origin(origin, CacheMode::Disk);
    env.add_object("/production/big.png", create_png(120, 60));

    let first = {
        let router = env.router();
        tokio::spawn(async move { get(router, "/production/big.png").await })
    };

    // Half the body is written by now
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!env.local_path("/production/big.png").exists());

    let (status, headers, body) = get(env.router(), "/production/big.png?w=60").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "x-cache-status"), "miss");
    assert_eq!(decode_dimensions(&body), (60, 30));

    let (status, _, body) = first.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert_eq!(decode_dimensions(&body), (120, 60));

    assert_eq!(env.origin.open_count(), 1);
}

#[tokio::test]
async fn test_concurrent_misses_on_different_keys() {
    let env = TestEnv::new(CacheMode::Disk);
    for i in 0..4 {
        env.add_object(&format!("/staging/k{}.png", i), create_png(8, 8));
    }

    let mut handles = Vec::new();
    for i in 0..4 {
        let router = env.router();
        let uri = format!("/staging/k{}.png", i);
        handles.push(tokio::spawn(async move { get(router, &uri).await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().0, StatusCode::OK);
    }

    assert_eq!(env.origin.open_count(), 4);
}

// =============================================================================
// Janitor
// =============================================================================

#[tokio::test]
async fn test_sweep_forces_refetch() {
    let env = TestEnv::new(CacheMode::Disk);
    env.add_object("/production/swept.png", create_png(10, 10));
    env.add_object("/staging/swept.png", create_png(10, 10));

    get(env.router(), "/production/swept.png").await;
    get(env.router(), "/staging/swept.png").await;
    assert_eq!(env.origin.open_count(), 2);

    let janitor = env.service.janitor(Duration::from_secs(3600)).unwrap();
    let report = janitor.sweep().await;
    assert_eq!(report.cleared.len(), 2);
    assert!(report.failed.is_empty());

    let production_root = env.local_path("/production/swept.png");
    assert!(!production_root.exists());
    assert!(production_root.parent().unwrap().is_dir());

    let (status, headers, _) = get(env.router(), "/production/swept.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "x-cache-status"), "miss");
    assert_eq!(env.origin.open_count(), 3);
}
