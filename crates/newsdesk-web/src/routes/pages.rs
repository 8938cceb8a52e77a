//! HTML page handlers: listing, search, post and oEmbed.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use newsdesk_core::output::{post_url, rendered_post};
use serde::{Deserialize, Serialize};

use super::{CurrentFeed, html_response, page_number};
use crate::error::SiteError;
use crate::render::pages;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    query: String,
    page: Option<String>,
}

/// Path of post routes; the optional `feed` segment is read by
/// [`CurrentFeed`].
#[derive(Debug, Deserialize)]
pub struct PostPath {
    id: String,
}

/// `GET /`
pub async fn home(
    State(state): State<AppState>,
    current: CurrentFeed,
    Query(query): Query<PageQuery>,
) -> Response {
    let page = page_number(query.page.as_deref());
    let html = current
        .cached(&state, &format!("home?page={page}"), || {
            pages::listing(&current.context, &current.index, page).into_string()
        })
        .await;
    html_response(html)
}

/// `GET /search`; an empty query goes back to the listing.
pub async fn search(
    State(state): State<AppState>,
    current: CurrentFeed,
    Query(query): Query<SearchQuery>,
) -> Response {
    let text = query.query.trim();
    if text.is_empty() {
        return Redirect::to(&current.context.root()).into_response();
    }

    let page = page_number(query.page.as_deref());
    let route = format!("search?query={}&page={page}", urlencoding::encode(text));
    let html = current
        .cached(&state, &route, || {
            pages::search(&current.context, &current.index, text, page).into_string()
        })
        .await;
    html_response(html)
}

/// `GET /post/{id}`
pub async fn post(
    State(state): State<AppState>,
    current: CurrentFeed,
    Path(PostPath { id }): Path<PostPath>,
) -> Result<Response, SiteError> {
    let Some(view) = rendered_post(&current.index, &id) else {
        return Err(SiteError::NotFound(format!("post {id}")));
    };

    let html = current
        .cached(&state, &format!("post/{id}"), || {
            pages::post(&current.context, &current.index, view).into_string()
        })
        .await;
    Ok(html_response(html))
}

/// oEmbed "link" response for a post.
#[derive(Debug, Serialize)]
pub struct OembedResponse {
    version: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    title: String,
    author_name: String,
    author_url: String,
    provider_name: String,
    provider_url: String,
}

/// `GET /post/{id}/oembed.json`
pub async fn oembed(
    current: CurrentFeed,
    Path(PostPath { id }): Path<PostPath>,
) -> Result<Json<OembedResponse>, SiteError> {
    let Some(view) = rendered_post(&current.index, &id) else {
        return Err(SiteError::NotFound(format!("post {id}")));
    };
    let post = view.post;

    Ok(Json(OembedResponse {
        version: "1.0",
        kind: "link",
        title: post.title_or_date().to_string(),
        author_name: format!("{} \u{2022} {}", post.author, post.date),
        author_url: post_url(&current.context.base_url, &post.source_id),
        provider_name: current.context.site_name.clone(),
        provider_url: current.context.base_url.clone(),
    }))
}
