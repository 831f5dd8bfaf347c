//! Error types for the gallery.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::fmt;
use tracing::error;

/// Gallery error type.
#[derive(Debug)]
pub enum Error {
    /// Configuration error.
    Config(String),
    /// Content store read failure.
    Content(String),
    /// Chain gateway failure.
    Chain(String),
    /// Unknown collection slug. Terminal, no retry.
    NotFound(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "config error: {msg}"),
            Error::Content(msg) => write!(f, "content store error: {msg}"),
            Error::Chain(msg) => write!(f, "chain gateway error: {msg}"),
            Error::NotFound(slug) => write!(f, "no collection matches slug \"{slug}\""),
        }
    }
}

impl std::error::Error for Error {}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound(slug) => (
                StatusCode::NOT_FOUND,
                Html(crate::pages::not_found(&slug)),
            )
                .into_response(),
            Error::Content(_) | Error::Chain(_) => {
                error!(error = %self, "Upstream read failed");
                (StatusCode::BAD_GATEWAY, Html(crate::pages::error_page())).into_response()
            }
            Error::Config(_) => {
                error!(error = %self, "Configuration error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Html(crate::pages::error_page()),
                )
                    .into_response()
            }
        }
    }
}
