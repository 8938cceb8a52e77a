//! Bearer token authentication for change notifications.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::SiteError;
use crate::state::AppState;

/// Middleware that requires a valid Bearer token.
///
/// The token must be provided in the `Authorization` header as:
/// ```text
/// Authorization: Bearer <token>
/// ```
///
/// Tokens are validated against `NEWS_NOTIFY_TOKENS`. With no tokens
/// configured the protected routes answer 404.
pub async fn require_notify_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, SiteError> {
    if state.config.notify_tokens.is_empty() {
        return Err(SiteError::NotFound("notifications are disabled".to_string()));
    }

    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let Some(token) = auth_header.and_then(|header| header.strip_prefix("Bearer ")) else {
        tracing::debug!("missing or malformed authorization header");
        return Err(SiteError::Unauthorized);
    };

    if !state.config.notify_tokens.contains(token.trim()) {
        tracing::debug!("invalid notify token");
        return Err(SiteError::Unauthorized);
    }

    Ok(next.run(request).await)
}
