//! Full HTML pages: listing, search results and single post.

use maud::{Markup, PreEscaped, html};
use newsdesk_core::index::page_count;
use newsdesk_core::output::{PostView, post_url, rendered_page, search_results};
use newsdesk_core::{DocumentIndex, PAGE_SIZE};

use super::components::{FeedContext, OpenGraphData, page_shell, pager, post_card};

/// Posts shown under "Other Recent Posts" on a post page.
const RECENT_POSTS: usize = 50;

/// Description used when a page has nothing better.
const LISTING_DESCRIPTION: &str = "Latest news and announcements";

/// Front page listing, 1-indexed.
pub fn listing(feed: &FeedContext, index: &DocumentIndex, page: i64) -> Markup {
    let page = page.max(1);
    let posts = rendered_page(index, page);
    let has_next = (page as usize) < page_count(index.len(), PAGE_SIZE);
    let canonical = if page > 1 {
        format!("{}/?page={page}", feed.base_url)
    } else {
        format!("{}/", feed.base_url)
    };

    let body = html! {
        @if posts.is_empty() {
            p class="results" { "No posts on this page." }
        }
        @for post in posts {
            (post_card(feed, post))
        }
        (pager(&feed.root(), page, has_next))
    };

    page_shell(
        feed,
        "News List",
        &canonical,
        OpenGraphData {
            title: "News List",
            description: LISTING_DESCRIPTION,
            og_type: "website",
            oembed: None,
        },
        body,
    )
}

/// Search results for a non-empty query.
pub fn search(feed: &FeedContext, index: &DocumentIndex, query: &str, page: i64) -> Markup {
    let page = page.max(1);
    let results = search_results(index, query, page);
    let has_next = (page as usize) < page_count(results.total, PAGE_SIZE);
    let encoded = urlencoding::encode(query);
    let base = format!("{}?query={encoded}", feed.path("/search"));
    let title = format!("Search: {query}");

    let body = html! {
        span class="results" {
            (results.total) " results for \u{201c}" (query) "\u{201d}"
        }
        @for post in &results.posts {
            (post_card(feed, post))
        }
        (pager(&base, page, has_next))
    };

    page_shell(
        feed,
        &title,
        &format!("{}/search?query={encoded}", feed.base_url),
        OpenGraphData {
            title: &title,
            description: LISTING_DESCRIPTION,
            og_type: "website",
            oembed: None,
        },
        body,
    )
}

/// Single post page with attachments and a tail of recent posts.
pub fn post(feed: &FeedContext, index: &DocumentIndex, view: PostView<'_>) -> Markup {
    let post = view.post;
    let canonical = post_url(&feed.base_url, &post.source_id);
    let oembed = format!("{canonical}/oembed.json");
    let recent: Vec<_> = index
        .posts()
        .iter()
        .filter(|other| other.source_id != post.source_id)
        .take(RECENT_POSTS)
        .collect();
    let has_more = index.len() > RECENT_POSTS + 1;

    let body = html! {
        article class="newsPost" {
            (PreEscaped(&post.html))
            @if !post.attachments.is_empty() {
                div class="attachmentList" {
                    @for url in &post.attachments {
                        a href=(url) target="_blank" rel="noopener noreferrer" {
                            img class="attachment" src=(url) alt="attachment" loading="lazy";
                        }
                    }
                }
            }
        }
        @if !recent.is_empty() {
            h2 class="section-title" { "Other Recent Posts" }
            @for other in recent {
                (post_card(feed, other))
            }
            @if has_more {
                p { a href=(format!("{}?page=2", feed.root())) { "See more" } }
            }
        }
    };

    page_shell(
        feed,
        post.title_or_date(),
        &canonical,
        OpenGraphData {
            title: post.title_or_date(),
            description: &post.description,
            og_type: "article",
            oembed: Some(&oembed),
        },
        body,
    )
}
