//! HTTP error responses for the web adapter.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::{error, warn};

use crate::domain::error::{ErrorKind, TwcorrError};

use super::templates::ErrorView;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Upstream failures are worth retrying after the cache is cleared.
    pub fn retryable(&self) -> bool {
        self.status == StatusCode::BAD_GATEWAY
    }

    pub fn fragment(&self) -> String {
        let view = ErrorView {
            status: self.status.as_u16(),
            message: &self.message,
            retry: self.retryable(),
        };
        askama::Template::render(&view).unwrap_or_else(|_| {
            format!(
                "<div class=\"error\"><p>Error {}</p></div>",
                self.status.as_u16()
            )
        })
    }
}

pub fn status_from_error(err: &TwcorrError) -> StatusCode {
    match err.kind() {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::DataUnavailable => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::UpstreamFetchFailure => StatusCode::BAD_GATEWAY,
        ErrorKind::Configuration | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<TwcorrError> for WebError {
    fn from(err: TwcorrError) -> Self {
        let status = status_from_error(&err);
        if status.is_server_error() {
            error!(error = %err, status = status.as_u16(), "request failed");
        } else {
            warn!(error = %err, status = status.as_u16(), "request rejected");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (self.status, Html(self.fragment())).into_response()
    }
}
