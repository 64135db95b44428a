//! Health check, fallbacks and general HTTP behaviour.

mod common;

use axum::http::StatusCode;
use common::{body_bytes, body_json, build_test_app};

#[tokio::test]
async fn health_check_reports_backend_and_version() {
    let app = build_test_app(false).await;
    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["storage"], "json");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn unknown_api_route_returns_error_envelope() {
    let app = build_test_app(false).await;
    let response = app.get("/api/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn client_side_routes_fall_back_to_index_html() {
    let app = build_test_app(false).await;
    let response = app.get("/missions/12").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(body.contains("<title>Vet Mission</title>"));
}

#[tokio::test]
async fn responses_carry_rate_limit_headers() {
    let app = build_test_app(false).await;
    let response = app.get("/api/missions").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-ratelimit-limit"], "300");
    assert!(response.headers().contains_key("x-ratelimit-remaining"));
}
