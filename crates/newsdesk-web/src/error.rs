//! Error types for the news site.
//!
//! Errors are rendered as simple HTML error pages, since this is a
//! user-facing HTML service.

use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use maud::{DOCTYPE, html};

/// Site error type.
#[derive(Debug, thiserror::Error)]
pub enum SiteError {
    /// Malformed query or path parameter.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unknown feed, or a post that does not exist or was removed.
    #[error("not found: {0}")]
    NotFound(String),

    /// Missing or invalid bearer token.
    #[error("unauthorized")]
    Unauthorized,

    /// A rebuild failed or timed out; the previous index is still served.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<newsdesk_core::Error> for SiteError {
    fn from(err: newsdesk_core::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

impl IntoResponse for SiteError {
    fn into_response(self) -> Response {
        let (status, title, message) = match &self {
            Self::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "Bad Request",
                format!("The request could not be understood: {msg}"),
            ),
            Self::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                "Not Found",
                format!("The requested page was not found: {msg}"),
            ),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Unauthorized",
                "A valid bearer token is required.".to_string(),
            ),
            Self::Unavailable(msg) => {
                tracing::warn!(error = %msg, "rebuild unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service Unavailable",
                    "The feed could not be refreshed. Please try again later.".to_string(),
                )
            }
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Error",
                    "An internal error occurred. Please try again later.".to_string(),
                )
            }
        };

        let markup = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1";
                    title { (title) }
                    meta name="robots" content="noindex";
                    style { (maud::PreEscaped(crate::render::components::ERROR_CSS)) }
                }
                body {
                    main class="error-page" {
                        h1 { (title) }
                        p { (message) }
                        a href="/" { "Back to the front page" }
                    }
                }
            }
        };

        let mut response = (status, markup).into_response();
        if matches!(self, Self::Unauthorized) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}
