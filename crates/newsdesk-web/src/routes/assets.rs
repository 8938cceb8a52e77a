//! Bundled static assets.

use axum::http::header;
use axum::response::IntoResponse;

use crate::render::MAIN_JS;

/// `GET /static/main.js`
pub async fn main_js() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        MAIN_JS,
    )
}
