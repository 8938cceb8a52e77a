//! Route definitions for the news site.
//!
//! ## Routes
//!
//! Per feed, served at the root for the default feed and under
//! `/f/{feed}` for every configured feed:
//! - `GET /` - Listing page (`?page=N`)
//! - `GET /search` - Search results (`?query=&page=`)
//! - `GET /post/{id}` - Single post page
//! - `GET /post/{id}/oembed.json` - oEmbed metadata for a post
//! - `GET /feed.rss` - RSS 2.0 feed (`?limit=&page=`)
//! - `GET /sitemap.xml` - Sitemap
//!
//! Site-wide:
//! - `POST /notify/{feed}` - Change notification (Bearer auth)
//! - `GET /health` - Health check (JSON)
//! - `GET /robots.txt` - Crawler instructions
//! - `GET /static/main.js` - Timestamp localization script

mod assets;
mod feed;
mod health;
mod notify;
mod pages;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use newsdesk_core::DocumentIndex;

use crate::auth::require_notify_token;
use crate::error::SiteError;
use crate::render;
use crate::render::components::FeedContext;
use crate::state::{AppState, Feed, cache_key};

/// Build the complete site router.
pub fn router(state: AppState) -> Router {
    let notify = Router::new()
        .route("/notify/{feed}", post(notify::notify_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_notify_token,
        ));

    Router::new()
        .merge(feed_routes())
        .nest("/f/{feed}", feed_routes())
        .merge(notify)
        .route("/health", get(health::health_check))
        .route("/robots.txt", get(robots_txt))
        .route("/static/main.js", get(assets::main_js))
        .with_state(state)
}

fn feed_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(pages::home))
        .route("/search", get(pages::search))
        .route("/post/{id}", get(pages::post))
        .route("/post/{id}/oembed.json", get(pages::oembed))
        .route("/feed.rss", get(feed::rss))
        .route("/sitemap.xml", get(feed::sitemap))
}

/// Serve robots.txt allowing all crawlers.
async fn robots_txt() -> impl IntoResponse {
    (
        [("content-type", "text/plain; charset=utf-8")],
        "User-agent: *\nAllow: /\n",
    )
}

/// The feed a request addresses, with a snapshot of its current index.
///
/// Requests outside `/f/{feed}` address the default feed.
pub struct CurrentFeed {
    pub feed: Arc<Feed>,
    pub index: Arc<DocumentIndex>,
    pub context: FeedContext,
}

impl FromRequestParts<AppState> for CurrentFeed {
    type Rejection = SiteError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let requested = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|Path(mut params)| params.remove("feed"));
        let default_feed = state.config.default_feed();
        let name = requested.as_deref().unwrap_or(default_feed);

        let feed = state
            .feed(name)
            .ok_or_else(|| SiteError::NotFound(format!("feed {name}")))?;
        let index = feed.slot.current();

        let prefix = if name == default_feed {
            String::new()
        } else {
            format!("/f/{name}")
        };
        let context = FeedContext {
            site_name: state.config.site_name.clone(),
            prefix,
            base_url: state.config.feed_base_url(name),
            article_count: index.len(),
        };

        Ok(Self {
            feed,
            index,
            context,
        })
    }
}

impl CurrentFeed {
    /// Serve `route` from the page cache, rendering it on a miss.
    ///
    /// Keys carry the index version, so a rebuilt index never serves stale
    /// pages.
    pub async fn cached(
        &self,
        state: &AppState,
        route: &str,
        render: impl FnOnce() -> String,
    ) -> String {
        let key = cache_key(&self.feed.name, self.index.version(), route);
        if let Some(cached) = state.cache.get(&key).await {
            tracing::debug!(key = %key, "cache hit");
            return cached;
        }

        tracing::debug!(key = %key, "cache miss, rendering");
        let html = render();
        state.cache.insert(key, html.clone()).await;
        html
    }
}

/// Parse a 1-indexed page parameter; anything unparsable is page 1.
pub(crate) fn page_number(raw: Option<&str>) -> i64 {
    raw.and_then(|value| value.trim().parse().ok())
        .unwrap_or(1)
        .max(1)
}

/// Build an HTML response with security, ETag and cache headers.
pub(crate) fn html_response(html: String) -> Response {
    build_response("text/html; charset=utf-8", html)
}

/// Build an XML response (RSS or sitemap).
pub(crate) fn xml_response(content_type: &'static str, body: String) -> Response {
    build_response(content_type, body)
}

fn build_response(content_type: &'static str, body: String) -> Response {
    let mut headers = HeaderMap::new();

    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));

    // Security headers
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(render::components::CSP_HEADER),
    );
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    // ETag (xxHash of content)
    let hash = xxhash_rust::xxh3::xxh3_64(body.as_bytes());
    let etag = format!("\"{}\"", hex_fmt::HexFmt(&hash.to_be_bytes()));
    if let Ok(val) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, val);
    }

    // 1min browser, 5min CDN, 1min SWR; notifications refresh the index
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=60, s-maxage=300, stale-while-revalidate=60"),
    );

    (StatusCode::OK, headers, body).into_response()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::export::tests::{TempDir, message_json, write_export};
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use newsdesk_core::MapResolver;
    use tower::ServiceExt;

    /// Feeds `news` (two live posts and a tombstone) and `updates`.
    pub(crate) async fn seeded_state(dir: &TempDir) -> AppState {
        let mut headline = message_json("1", "2024-01-01T10:00:00Z", "# Storm warning\nStay inside");
        headline["ast"] = serde_json::json!([
            {"type": "text", "content": "# Storm warning"},
            {"type": "br"},
            {"type": "text", "content": "Stay inside"}
        ]);
        write_export(
            &dir.0,
            "news",
            vec![
                headline,
                message_json("2", "2024-01-02T10:00:00Z", "Calm seas ahead"),
                message_json("3", "2024-01-03T10:00:00Z", "[deleted]"),
            ],
        );
        write_export(
            &dir.0,
            "updates",
            vec![message_json("10", "2024-02-01T10:00:00Z", "Release notes")],
        );
        let state = AppState::new(
            test_config(dir.0.clone(), &["news", "updates"]),
            Arc::new(MapResolver::default()),
        );
        state.refresh_all().await;
        state
    }

    pub(crate) async fn get(state: &AppState, uri: &str) -> (StatusCode, HeaderMap, String) {
        let response = router(state.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn page_numbers() {
        assert_eq!(page_number(None), 1);
        assert_eq!(page_number(Some("3")), 3);
        assert_eq!(page_number(Some("0")), 1);
        assert_eq!(page_number(Some("-4")), 1);
        assert_eq!(page_number(Some("two")), 1);
    }

    #[tokio::test]
    async fn home_lists_default_feed() {
        let dir = TempDir::new("routes-home");
        let state = seeded_state(&dir).await;
        let (status, headers, body) = get(&state, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "text/html; charset=utf-8");
        assert_eq!(headers[header::X_FRAME_OPTIONS], "DENY");
        assert!(headers.contains_key(header::ETAG));
        assert!(body.contains("Calm seas ahead"));
        assert!(body.contains("<h1>Storm warning</h1>"));
        assert!(!body.contains("[deleted]"));
        assert!(!body.contains("Release notes"));
    }

    #[tokio::test]
    async fn nested_feed_routes() {
        let dir = TempDir::new("routes-nested");
        let state = seeded_state(&dir).await;
        let (status, _, body) = get(&state, "/f/updates").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Release notes"));
        assert!(body.contains("href=\"/f/updates/post/10\""));

        let (status, _, _) = get(&state, "/f/unknown").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn identical_requests_share_etag() {
        let dir = TempDir::new("routes-etag");
        let state = seeded_state(&dir).await;
        let (_, first, _) = get(&state, "/?page=1").await;
        let (_, second, _) = get(&state, "/?page=1").await;
        assert_eq!(first[header::ETAG], second[header::ETAG]);
    }

    #[tokio::test]
    async fn robots_and_script() {
        let dir = TempDir::new("routes-static");
        let state = seeded_state(&dir).await;
        let (status, _, body) = get(&state, "/robots.txt").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "User-agent: *\nAllow: /\n");

        let (status, headers, body) = get(&state, "/static/main.js").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            headers[header::CONTENT_TYPE],
            "text/javascript; charset=utf-8"
        );
        assert!(body.contains("data-format"));
    }
}
