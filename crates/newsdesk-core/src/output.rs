//! Read-side fragments served for one channel index.

use chrono::{DateTime, Utc};
use maud::{PreEscaped, html};

use crate::index::{DocumentIndex, PAGE_SIZE, RenderedPost, paginate, search};
use crate::postprocess::cdata;

/// RFC 1123 date as used in RSS `pubDate`.
const RSS_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// A post together with its rendered body, for the post page.
#[derive(Debug, Clone, Copy)]
pub struct PostView<'a> {
    pub post: &'a RenderedPost,
    /// Body HTML without the byline.
    pub body: &'a str,
}

/// One page of search hits plus the overall hit count.
#[derive(Debug, Clone)]
pub struct SearchResults<'a> {
    pub total: usize,
    pub posts: Vec<&'a RenderedPost>,
}

/// `<url>` entry of the sitemap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: String,
}

/// Canonical URL of a post.
pub fn post_url(base_url: &str, source_id: &str) -> String {
    format!("{base_url}/post/{source_id}")
}

/// Listing page (1-indexed, [`PAGE_SIZE`] cards).
pub fn rendered_page(index: &DocumentIndex, page: i64) -> &[RenderedPost] {
    paginate(index.posts(), page, PAGE_SIZE)
}

/// A post by source id; `None` for unknown, deleted or blacklisted ids.
pub fn rendered_post<'a>(index: &'a DocumentIndex, source_id: &str) -> Option<PostView<'a>> {
    let post = index.post(source_id)?;
    let body = index.body(source_id)?;
    Some(PostView { post, body })
}

/// One page of search hits.
pub fn search_results<'a>(index: &'a DocumentIndex, query: &str, page: i64) -> SearchResults<'a> {
    let hits = search(index.posts(), query);
    SearchResults {
        total: hits.len(),
        posts: paginate(&hits, page, PAGE_SIZE).to_vec(),
    }
}

fn rss_date(at: DateTime<Utc>) -> String {
    at.format(RSS_DATE_FORMAT).to_string()
}

/// RSS `<item>` elements, newest first.
///
/// With `max_count` the feed is cut into pages of that size (`page`
/// defaults to 1); without it every post is listed.
pub fn rss_items(
    index: &DocumentIndex,
    base_url: &str,
    max_count: Option<usize>,
    page: Option<i64>,
) -> Vec<String> {
    let posts = match max_count {
        Some(size) => paginate(index.posts(), page.unwrap_or(1), size),
        None => index.posts(),
    };

    posts
        .iter()
        .map(|post| {
            let body = index.body(&post.source_id).unwrap_or_default();
            let item = html! {
                item {
                    title { (post.title_or_date()) }
                    link { (post_url(base_url, &post.source_id)) }
                    description { (PreEscaped(cdata(body))) }
                    pubDate { (rss_date(post.created_at)) }
                    guid isPermaLink="false" { (post.source_id) }
                }
            };
            item.into_string()
        })
        .collect()
}

/// Sitemap entries for every post.
pub fn sitemap_entries(index: &DocumentIndex, base_url: &str) -> Vec<SitemapEntry> {
    index
        .posts()
        .iter()
        .map(|post| SitemapEntry {
            loc: post_url(base_url, &post.source_id),
            lastmod: post
                .edited_at
                .unwrap_or(post.created_at)
                .format("%Y-%m-%d")
                .to_string(),
        })
        .collect()
}
