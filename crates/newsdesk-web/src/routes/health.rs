//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    feeds: Vec<FeedHealth>,
}

/// Index state of one feed.
#[derive(Debug, Clone, Serialize)]
pub struct FeedHealth {
    name: String,
    /// 0 until the first successful rebuild.
    index_version: u64,
    posts: usize,
    rebuilding: bool,
}

/// Public health check endpoint.
///
/// Returns basic service health for load balancer probes, plus the index
/// state of every feed in configuration order.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let feeds = state
        .config
        .feeds
        .iter()
        .filter_map(|name| state.feed(name))
        .map(|feed| FeedHealth {
            name: feed.name.clone(),
            index_version: feed.slot.version(),
            posts: feed.slot.current().len(),
            rebuilding: feed.slot.is_rebuilding(),
        })
        .collect();

    Json(HealthResponse {
        status: "ok",
        service: "newsdesk",
        version: env!("CARGO_PKG_VERSION"),
        feeds,
    })
}
