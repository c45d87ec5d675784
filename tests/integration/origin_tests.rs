//! HTTP origin integration tests.
//!
//! Tests run the real reqwest-backed origin against a local axum server:
//! - Successful fetches stream the full body
//! - Non-success statuses map to OriginNotFound
//! - The full proxy path works end to end over HTTP

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::{routing::get as get_route, Router};
use bytes::Bytes;

use image_relay::error::IoError;
use image_relay::io::{HttpOrigin, Origin, OriginBody};
use image_relay::object::{LocatorSettings, ObjectLocator};
use image_relay::server::{create_router, RouterConfig};
use image_relay::transform::{CacheMode, ImageService};

use super::test_utils::{create_png, decode_dimensions, get, header};

/// Serve `payload` at `/{bucket}/img/pic.png`, 404 elsewhere, 403 on `/forbidden`.
async fn spawn_origin_server(bucket: &str, payload: Vec<u8>) -> SocketAddr {
    let payload = Bytes::from(payload);
    let app = Router::new()
        .route(
            &format!("/{}/img/pic.png", bucket),
            get_route(move || {
                let payload = payload.clone();
                async move { payload }
            }),
        )
        .route("/forbidden", get_route(|| async { StatusCode::FORBIDDEN }));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_http_origin_reads_body() {
    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let addr = spawn_origin_server("bucket", payload.clone()).await;

    let origin = HttpOrigin::new(None).unwrap();
    let body = origin
        .open(&format!("http://{}/bucket/img/pic.png", addr))
        .await
        .unwrap();
    let data = body.read_to_end().await.unwrap();

    assert_eq!(data.len(), payload.len());
    assert_eq!(&data[..], &payload[..]);
}

#[tokio::test]
async fn test_http_origin_not_found() {
    let addr = spawn_origin_server("bucket", vec![1, 2, 3]).await;

    let origin = HttpOrigin::new(None).unwrap();
    let result = origin.open(&format!("http://{}/bucket/missing.png", addr)).await;

    assert!(matches!(
        result,
        Err(IoError::OriginNotFound { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_http_origin_forbidden_is_not_found() {
    let addr = spawn_origin_server("bucket", vec![1, 2, 3]).await;

    let origin = HttpOrigin::new(None).unwrap();
    let result = origin.open(&format!("http://{}/forbidden", addr)).await;

    assert!(matches!(
        result,
        Err(IoError::OriginNotFound { status: 403, .. })
    ));
}

#[tokio::test]
async fn test_proxy_over_http_origin() {
    let dir = tempfile::tempdir().unwrap();
    let production_root = dir.path().join("prd").to_string_lossy().into_owned();
    let staging_root = dir.path().join("stg").to_string_lossy().into_owned();

    // The origin path mirrors the physical root
    let addr = spawn_origin_server(production_root.trim_start_matches('/'), create_png(200, 100)).await;

    let settings = LocatorSettings::new(format!("http://{}", addr), staging_root, production_root);
    let service = ImageService::with_executor(
        ObjectLocator::new(settings),
        Arc::new(HttpOrigin::new(None).unwrap()),
        CacheMode::Disk,
        Default::default(),
    );
    let router = create_router(service, RouterConfig::new().with_tracing(false));

    let (status, headers, body) =
        get(router.clone(), "/production/img/pic.png?w=50&format=webp").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "content-type"), "image/webp");
    assert_eq!(header(&headers, "x-cache-status"), "miss");
    assert_eq!(decode_dimensions(&body), (50, 25));

    let (status, headers, _) = get(router, "/production/img/pic.png").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(header(&headers, "x-cache-status"), "hit");
}
