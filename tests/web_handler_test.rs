//! Web handler integration tests.
//!
//! Tests cover:
//! - Form pages as full pages and as htmx fragments
//! - Correlation and comparison submissions
//! - Error status mapping rendered inline
//! - Cache clearing and the 404 fallback

mod common;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;
use twcorr::adapters::web::{AppState, build_router};
use twcorr::domain::correlation::WindowPolicy;
use twcorr::domain::settings::DashboardSettings;

use common::*;

fn settings() -> DashboardSettings {
    DashboardSettings {
        candidate_limit: 50,
        window_policy: WindowPolicy::default(),
        session_ttl_minutes: 60,
    }
}

fn app(fetcher: MockPriceFetcher) -> Router {
    build_router(AppState::new(sample_universe(), Arc::new(fetcher), settings()))
}

fn app_with_prices() -> Router {
    app(MockPriceFetcher::new()
        .with_series(wave_series("2330", "2024-01-02", 130, 600.0, 0.0))
        .with_series(wave_series("2454", "2024-01-02", 130, 900.0, 0.5))
        .with_series(wave_series("2303", "2024-01-02", 130, 50.0, 2.0)))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

fn get(uri: &str, htmx: bool) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if htmx {
        builder = builder.header("HX-Request", "true");
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("HX-Request", "true")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

#[tokio::test]
async fn index_renders_full_page_with_correlation_form() {
    let (status, body) = send(app_with_prices(), get("/", false)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<!DOCTYPE html>"));
    assert!(body.contains("htmx.org"));
    assert!(body.contains("hx-post=\"/correlation/run\""));
    assert!(body.contains("<option value=\"2330\" selected>"));
    assert!(body.contains("半導體業"));
}

#[tokio::test]
async fn htmx_request_gets_fragment_only() {
    let (status, body) = send(app_with_prices(), get("/correlation", true)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("<!DOCTYPE html>"));
    assert!(body.contains("name=\"ticker\""));
}

#[tokio::test]
async fn comparison_page_preselects_defaults() {
    let (status, body) = send(app_with_prices(), get("/comparison", false)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("name=\"ticker_a\""));
    assert!(body.contains("<option value=\"2454\" selected>"));
    assert!(body.contains("<option value=\"120\" selected>"));
}

#[tokio::test]
async fn correlation_run_renders_ranked_table() {
    let (status, body) = send(app_with_prices(), post_form("/correlation/run", "ticker=2330&category=all&limit=")).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains("2330 台積電"));
    assert!(body.contains("聯發科"));
    assert!(body.contains("120日相關係數"));
    assert!(body.contains("background-color: rgb("));
    // candidates without prices show the undefined marker and the missing list
    assert!(body.contains("—"));
    assert!(body.contains("2382"));
    assert!(body.contains("無法取得股價資料"));
    assert!(body.contains("<tr class=\"undefined\">"));
}

#[tokio::test]
async fn correlation_run_with_category_filter() {
    let (status, body) = send(
        app_with_prices(),
        post_form("/correlation/run", "ticker=2330&category=optoelectronics&limit=0"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("大立光"));
    assert!(!body.contains("聯發科"));
}

#[tokio::test]
async fn unknown_ticker_is_bad_request() {
    let (status, body) = send(app_with_prices(), post_form("/correlation/run", "ticker=0000")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("class=\"error\""));
    assert!(body.contains("0000"));
    assert!(!body.contains("/cache/clear"));
}

#[tokio::test]
async fn bad_limit_is_bad_request() {
    let (status, _) = send(app_with_prices(), post_form("/correlation/run", "ticker=2330&limit=lots")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reference_without_prices_is_unprocessable() {
    let (status, body) = send(app(MockPriceFetcher::new()), post_form("/correlation/run", "ticker=2330")).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body.contains("2330"));
}

#[tokio::test]
async fn failed_candidate_still_renders_the_table() {
    let fetcher = MockPriceFetcher::new()
        .with_series(wave_series("2330", "2024-01-02", 130, 600.0, 0.0))
        .with_series(wave_series("2303", "2024-01-02", 130, 50.0, 2.0))
        .with_error("2454", "timeout");
    let (status, body) = send(app(fetcher), post_form("/correlation/run", "ticker=2330")).await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains("聯電"));
    assert!(body.contains("無法取得股價資料"));
    assert!(body.contains("2454"));
}

#[tokio::test]
async fn upstream_failure_is_bad_gateway_with_retry() {
    let fetcher = MockPriceFetcher::new()
        .with_series(wave_series("2454", "2024-01-02", 130, 900.0, 0.0))
        .with_error("2330", "timeout");
    let (status, body) = send(app(fetcher), post_form("/correlation/run", "ticker=2330")).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("timeout"));
    assert!(body.contains("hx-post=\"/cache/clear\""));
}

#[tokio::test]
async fn comparison_run_renders_charts_and_detail_table() {
    let (status, body) = send(
        app_with_prices(),
        post_form("/comparison/run", "ticker_a=2330&ticker_b=2454&days=60"),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body.contains("2330 台積電 vs 2454 聯發科"));
    assert_eq!(body.matches("<svg").count(), 2);
    assert!(body.contains("20日均比"));
    assert!(body.contains("60日均比"));
    assert!(!body.contains("120日均比"));
    assert!(body.contains("<details>"));
}

#[tokio::test]
async fn comparison_of_same_stock_is_bad_request() {
    let (status, _) = send(
        app_with_prices(),
        post_form("/comparison/run", "ticker_a=2330&ticker_b=2330&days=120"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn comparison_rejects_unlisted_lookback() {
    let (status, _) = send(
        app_with_prices(),
        post_form("/comparison/run", "ticker_a=2330&ticker_b=2454&days=45"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_htmx_submission_is_wrapped_in_layout() {
    let request = Request::builder()
        .method("POST")
        .uri("/comparison/run")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("ticker_a=2330&ticker_b=2454&days=30"))
        .unwrap();
    let (status, body) = send(app_with_prices(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<!DOCTYPE html>"));
    assert!(body.contains("<svg"));
}

#[tokio::test]
async fn cache_clear_reports_dropped_entries() {
    let (status, body) = send(app_with_prices(), post_form("/cache/clear", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("已清除 0 筆快取資料"));
}

#[tokio::test]
async fn unknown_route_is_not_found_page() {
    let (status, body) = send(app_with_prices(), get("/nope", false)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("<!DOCTYPE html>"));
    assert!(body.contains("404"));
}
