//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use page_cache::{
    api::create_router, cache::current_timestamp, store::MemoryStore, AppState, CacheEngine,
};
use serde_json::Value;
use tower::ServiceExt;

// == Helper Functions ==

fn create_test_app(capacity: u64) -> Router {
    let engine = CacheEngine::new(MemoryStore::new(), capacity, 300);
    create_router(AppState::new(engine, 2))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: impl Into<Body>) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(body.into())
                .unwrap(),
        )
        .await
        .unwrap()
}

// == PUT /pages ==

#[tokio::test]
async fn test_upsert_endpoint_success() {
    let app = create_test_app(1024);

    let response = send(&app, "PUT", "/pages?url=home", "<html>home</html>").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["url"], "home");
    assert_eq!(json["changed"], true);

    let response = send(&app, "PUT", "/pages?url=home", "<html>v2</html>").await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["changed"], false);
}

#[tokio::test]
async fn test_upsert_endpoint_too_large_for_capacity() {
    let app = create_test_app(10);

    let response = send(&app, "PUT", "/pages?url=big", "0123456789").await;

    assert_eq!(response.status(), StatusCode::INSUFFICIENT_STORAGE);
    let json = body_to_json(response.into_body()).await;
    assert!(json["error"].as_str().unwrap().contains("Capacity"));
}

#[tokio::test]
async fn test_upsert_endpoint_empty_url() {
    let app = create_test_app(1024);

    let response = send(&app, "PUT", "/pages?url=", "body").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// == GET /pages ==

#[tokio::test]
async fn test_get_endpoint_returns_raw_content() {
    let app = create_test_app(1024);
    send(&app, "PUT", "/pages?url=https%3A%2F%2Fa.io%2Fx", "payload").await;

    let response = send(&app, "GET", "/pages?url=https%3A%2F%2Fa.io%2Fx", Body::empty()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "application/octet-stream"
    );
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"payload");
}

#[tokio::test]
async fn test_get_endpoint_not_found() {
    let app = create_test_app(1024);

    let response = send(&app, "GET", "/pages?url=nothing", Body::empty()).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert!(json.get("error").is_some());
}

// == DELETE /pages ==

#[tokio::test]
async fn test_delete_endpoint_success() {
    let app = create_test_app(1024);
    send(&app, "PUT", "/pages?url=gone", "12345").await;

    let response = send(&app, "DELETE", "/pages?url=gone", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["bytes_freed"], 9);

    let response = send(&app, "GET", "/pages?url=gone", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "DELETE", "/pages?url=gone", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// == Eviction through the API ==

#[tokio::test]
async fn test_capacity_eviction_through_api() {
    let app = create_test_app(100);
    let ttl = current_timestamp() + 1000;
    let body = "x".repeat(59);

    send(&app, "PUT", &format!("/pages?url=A&ttl={}", ttl), body.clone()).await;
    let response = send(&app, "PUT", &format!("/pages?url=B&ttl={}", ttl), body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/pages?url=A", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = send(&app, "GET", "/pages?url=B", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/stats", Body::empty()).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["evictions"], 1);
    assert_eq!(json["used_bytes"], 60);
}

// == GET /pages/top ==

#[tokio::test]
async fn test_top_endpoint_ranks_by_access() {
    let app = create_test_app(1024);
    for (url, accesses) in [("a", 5), ("b", 3), ("c", 9)] {
        send(&app, "PUT", &format!("/pages?url={}", url), "x").await;
        for _ in 1..accesses {
            send(&app, "GET", &format!("/pages?url={}", url), Body::empty()).await;
        }
    }

    // Default n comes from the app state (2)
    let response = send(&app, "GET", "/pages/top", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(
        json,
        serde_json::json!({"pages": [{"url": "c", "score": 9}, {"url": "a", "score": 5}]})
    );

    let response = send(&app, "GET", "/pages/top?n=3", Body::empty()).await;
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["pages"].as_array().unwrap().len(), 3);
}

// == POST /pages/expire ==

#[tokio::test]
async fn test_expire_endpoint_removes_stale_pages() {
    let app = create_test_app(1024);
    let stale = current_timestamp() - 1;
    send(&app, "PUT", &format!("/pages?url=x&ttl={}", stale), "old").await;
    send(&app, "PUT", "/pages?url=y", "new").await;

    let response = send(&app, "POST", "/pages/expire", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["bytes_freed"], 4);

    let response = send(&app, "GET", "/pages?url=x", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = send(&app, "GET", "/pages?url=y", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);
}

// == GET /stats, GET /health ==

#[tokio::test]
async fn test_stats_endpoint() {
    let app = create_test_app(1024);
    send(&app, "PUT", "/pages?url=s", "v").await;
    send(&app, "GET", "/pages?url=s", Body::empty()).await;
    send(&app, "GET", "/pages?url=missing", Body::empty()).await;

    let response = send(&app, "GET", "/stats", Body::empty()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["used_bytes"], 2);
    assert_eq!(json["capacity_bytes"], 1024);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.5).abs() < 0.001);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(1024);

    let response = send(&app, "GET", "/health", Body::empty()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], "healthy");
}
