//! Web dashboard adapter.
//!
//! Axum server with an htmx frontend: the correlation table and the two-stock
//! comparison are rendered server-side as HTML fragments.

pub mod chart_svg;
mod error;
mod handlers;
pub mod session;
mod templates;

pub use error::{WebError, status_from_error};
pub use handlers::*;
pub use session::SessionCaches;
pub use templates::*;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::domain::settings::DashboardSettings;
use crate::domain::universe::Universe;
use crate::ports::price_port::PriceFetchPort;

pub struct AppState {
    pub universe: Arc<Universe>,
    pub fetcher: Arc<dyn PriceFetchPort>,
    pub caches: Arc<SessionCaches>,
    pub settings: Arc<DashboardSettings>,
}

impl AppState {
    pub fn new(
        universe: Universe,
        fetcher: Arc<dyn PriceFetchPort>,
        settings: DashboardSettings,
    ) -> Self {
        Self {
            universe: Arc::new(universe),
            fetcher,
            caches: Arc::new(SessionCaches::with_ttl_minutes(settings.session_ttl_minutes)),
            settings: Arc::new(settings),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            state.settings.session_ttl_minutes,
        )));

    Router::new()
        .route("/", get(handlers::correlation_page))
        .route("/correlation", get(handlers::correlation_page))
        .route("/correlation/run", post(handlers::run_correlation))
        .route("/comparison", get(handlers::comparison_page))
        .route("/comparison/run", post(handlers::run_comparison))
        .route("/cache/clear", post(handlers::clear_cache))
        .nest_service("/static", ServeDir::new("static"))
        .fallback(handlers::not_found)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}
