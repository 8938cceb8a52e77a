//! RSS feed and sitemap handlers.

use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;

use super::{CurrentFeed, xml_response};
use crate::render::xml;
use crate::state::AppState;

const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";
const SITEMAP_CONTENT_TYPE: &str = "application/xml; charset=utf-8";

#[derive(Debug, Deserialize)]
pub struct RssQuery {
    limit: Option<String>,
    page: Option<String>,
}

/// `GET /feed.rss`
///
/// Without `limit` every post is listed. `page` only applies together with
/// `limit`.
pub async fn rss(
    State(state): State<AppState>,
    current: CurrentFeed,
    Query(query): Query<RssQuery>,
) -> Response {
    let limit = query
        .limit
        .as_deref()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .filter(|&limit| limit > 0);
    let page = limit.map(|_| super::page_number(query.page.as_deref()));

    let route = match (limit, page) {
        (Some(limit), Some(page)) => format!("rss?limit={limit}&page={page}"),
        _ => "rss".to_string(),
    };
    let body = current
        .cached(&state, &route, || {
            xml::rss(&current.context, &current.index, limit, page)
        })
        .await;
    xml_response(RSS_CONTENT_TYPE, body)
}

/// `GET /sitemap.xml`
pub async fn sitemap(State(state): State<AppState>, current: CurrentFeed) -> Response {
    let body = current
        .cached(&state, "sitemap", || {
            xml::sitemap(&current.context, &current.index)
        })
        .await;
    xml_response(SITEMAP_CONTENT_TYPE, body)
}
