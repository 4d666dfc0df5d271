//! HTTP request handlers for web adapter.

use axum::{
    Form,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::info;

use crate::domain::comparison::{COMPARISON_LOOKBACK, COMPARISON_LOOKBACK_CHOICES};
use crate::domain::dashboard::{
    CorrelationOptions, CorrelationRequest, comparison_report, correlation_report,
};
use crate::domain::universe::{Category, Universe};

use super::session::session_cache_key;
use super::templates::{
    BasePage, ComparisonFormView, ComparisonView, CorrelationFormView, CorrelationTableView,
    render,
};
use super::{AppState, WebError, is_htmx_request};

const DEFAULT_REFERENCE: &str = "2330";
const DEFAULT_PARTNER: &str = "2454";

/// Wraps `result` in the base layout unless htmx asked for the fragment only.
fn respond(
    headers: &HeaderMap,
    title: &str,
    active: &str,
    result: Result<String, WebError>,
) -> Response {
    let (status, content) = match result {
        Ok(html) => (StatusCode::OK, html),
        Err(e) => (e.status, e.fragment()),
    };
    if is_htmx_request(headers) {
        return (status, Html(content)).into_response();
    }
    let page = BasePage {
        title,
        active,
        content: &content,
    };
    match render(&page) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// `preferred` when listed, else the first ticker not equal to `avoid`.
fn default_ticker(universe: &Universe, preferred: &str, avoid: &str) -> String {
    if universe.get(preferred).is_some() && preferred != avoid {
        return preferred.to_string();
    }
    universe
        .stocks()
        .map(|s| s.ticker.clone())
        .find(|t| t != avoid)
        .unwrap_or_default()
}

pub async fn correlation_page(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let reference = default_ticker(&state.universe, DEFAULT_REFERENCE, "");
    let view = CorrelationFormView::new(&state.universe, &reference, state.settings.candidate_limit);
    respond(&headers, "電子股相關係數", "correlation", render(&view))
}

#[derive(Debug, Deserialize)]
pub struct CorrelationFormData {
    pub ticker: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub limit: String,
}

fn parse_category(raw: &str) -> Result<Option<Category>, WebError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    raw.parse::<Category>()
        .map(Some)
        .map_err(|_| WebError::bad_request(format!("未知的產業類別: {raw}")))
}

fn parse_limit(raw: &str, default: usize) -> Result<usize, WebError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(default);
    }
    raw.parse::<usize>()
        .map_err(|_| WebError::bad_request(format!("比較檔數必須是非負整數: {raw}")))
}

fn parse_lookback(raw: &str) -> Result<usize, WebError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(COMPARISON_LOOKBACK);
    }
    raw.parse::<usize>()
        .ok()
        .filter(|d| COMPARISON_LOOKBACK_CHOICES.contains(d))
        .ok_or_else(|| {
            WebError::bad_request(format!(
                "觀察天數必須是 {:?} 之一: {raw}",
                COMPARISON_LOOKBACK_CHOICES
            ))
        })
}

async fn correlation_fragment(
    state: &AppState,
    session: &Session,
    form: &CorrelationFormData,
) -> Result<String, WebError> {
    let request = CorrelationRequest {
        reference: form.ticker.trim().to_string(),
        category: parse_category(&form.category)?,
        limit: Some(parse_limit(&form.limit, state.settings.candidate_limit)?),
    };
    let key = session_cache_key(session).await?;
    let cache = state.caches.cache_for(&key);

    let options = CorrelationOptions {
        policy: state.settings.window_policy,
    };
    let report = correlation_report(
        &state.universe,
        state.fetcher.as_ref(),
        &cache,
        &request,
        options,
    )
    .await?;
    info!(
        reference = %report.reference.ticker,
        rows = report.entries.len(),
        missing = report.missing.len(),
        "correlation table ready"
    );
    render(&CorrelationTableView::from_report(&report, options.policy))
}

pub async fn run_correlation(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<CorrelationFormData>,
) -> Response {
    let result = correlation_fragment(&state, &session, &form).await;
    respond(&headers, "電子股相關係數", "correlation", result)
}

pub async fn comparison_page(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let a = default_ticker(&state.universe, DEFAULT_REFERENCE, "");
    let b = default_ticker(&state.universe, DEFAULT_PARTNER, &a);
    let view = ComparisonFormView::new(&state.universe, &a, &b, COMPARISON_LOOKBACK);
    respond(&headers, "兩檔股價比較", "comparison", render(&view))
}

#[derive(Debug, Deserialize)]
pub struct ComparisonFormData {
    pub ticker_a: String,
    pub ticker_b: String,
    #[serde(default)]
    pub days: String,
}

async fn comparison_fragment(
    state: &AppState,
    session: &Session,
    form: &ComparisonFormData,
) -> Result<String, WebError> {
    let lookback = parse_lookback(&form.days)?;
    let key = session_cache_key(session).await?;
    let cache = state.caches.cache_for(&key);

    let report = comparison_report(
        &state.universe,
        state.fetcher.as_ref(),
        &cache,
        form.ticker_a.trim(),
        form.ticker_b.trim(),
        lookback,
    )
    .await?;
    render(&ComparisonView::from_report(&report))
}

pub async fn run_comparison(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<ComparisonFormData>,
) -> Response {
    let result = comparison_fragment(&state, &session, &form).await;
    respond(&headers, "兩檔股價比較", "comparison", result)
}

pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Html<String>, WebError> {
    let key = session_cache_key(&session).await?;
    let dropped = state.caches.clear(&key);
    info!(dropped, "session price cache cleared");
    Ok(Html(format!(
        "<span class=\"notice\">已清除 {dropped} 筆快取資料</span>"
    )))
}

pub async fn not_found(headers: HeaderMap) -> Response {
    respond(
        &headers,
        "找不到頁面",
        "",
        Err(WebError::not_found("找不到此頁面")),
    )
}
