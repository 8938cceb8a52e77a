//! Shared HTML components used across all site pages.
//!
//! These are maud functions that return `Markup` fragments for composition
//! into full pages.

use maud::{DOCTYPE, Markup, PreEscaped, html};
use newsdesk_core::RenderedPost;

/// Inline CSS for all site pages.
pub const PAGE_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
:root{--bg:#fafafa;--fg:#111;--fg2:#555;--fg3:#999;--accent:#c0392b;--surface:#fff;--border:rgba(192,57,43,.18);--mono:"SF Mono",SFMono-Regular,ui-monospace,Menlo,monospace}
body{font-family:Georgia,"Times New Roman",serif;line-height:1.6;color:var(--fg);background:var(--bg);min-height:100vh;display:flex;flex-direction:column;align-items:center;padding:1.5rem 1rem}
header.masthead{max-width:720px;width:100%;display:flex;align-items:center;justify-content:space-between;gap:1rem;margin-bottom:1.5rem;flex-wrap:wrap}
.masthead-title{font-size:1.6rem;font-weight:700;color:var(--fg);letter-spacing:-.01em}
.masthead form{display:flex;gap:.4rem}
.masthead input[type=text]{padding:.35rem .6rem;border:1px solid var(--border);border-radius:6px;background:var(--surface);color:var(--fg)}
.masthead input[type=submit]{padding:.35rem .8rem;border:none;border-radius:6px;background:var(--accent);color:#fff;cursor:pointer}
main{max-width:720px;width:100%;flex:1}
a{color:var(--accent);text-decoration:none}
a:hover{text-decoration:underline}
img{max-width:100%;height:auto}
img.emoji{width:1.25em;height:1.25em;vertical-align:-.25em}

.newsPost{padding:1.25rem 1.5rem;border:1px solid var(--border);border-radius:10px;margin-bottom:1rem;background:var(--surface);word-break:break-word}
.newsPost h1{font-size:1.45rem;line-height:1.3;margin:.5rem 0}
.newsPost h2{font-size:1.2rem;line-height:1.3;margin:.5rem 0}
.newsPost .sub{display:block;text-transform:uppercase;font-size:.75rem;letter-spacing:.08em;color:var(--accent);margin-top:.5rem}
.newsPost blockquote{border-left:3px solid var(--border);padding:.25rem 0 .25rem 1rem;margin:.5rem 0;color:var(--fg2)}
.newsPost pre{background:var(--bg);border:1px solid var(--border);border-radius:6px;padding:.75rem 1rem;overflow-x:auto;margin:.5rem 0;font-size:.85rem}
.newsPost code{font-family:var(--mono);font-size:.88em}
.newsPost .spoiler{background:var(--fg);color:var(--fg);border-radius:3px}
.newsPost .spoiler:hover{color:var(--bg)}
.post-meta{font-size:.85rem;color:var(--fg3);margin-top:.75rem}

.attachmentList{display:grid;grid-template-columns:1fr 1fr;gap:4px;margin:.75rem 0}
.attachment{width:100%;border-radius:6px;object-fit:cover}

.results{display:block;color:var(--fg2);margin-bottom:1rem}
.pager{display:flex;justify-content:space-between;margin:1rem 0}
.section-title{font-size:1.2rem;margin:2rem 0 1rem}

.footer{text-align:center;margin-top:1rem;padding-top:.75rem;font-size:.8rem;color:var(--fg3);width:100%;max-width:720px}
.footer a{color:var(--accent)}

@media(prefers-color-scheme:dark){
:root{--bg:#0f0f12;--fg:#e5e5e5;--fg2:#a0a0a0;--fg3:#666;--accent:#ff6b5b;--surface:#16161b;--border:rgba(255,107,91,.2)}
}
"#;

/// Inline CSS for error pages.
pub const ERROR_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
body{font-family:-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;display:flex;justify-content:center;align-items:center;min-height:100vh;background:#fafafa;color:#1a1a2e;padding:1rem}
.error-page{text-align:center;max-width:400px}
.error-page h1{font-size:1.5rem;margin-bottom:.75rem}
.error-page p{color:#666;margin-bottom:1rem;line-height:1.5}
.error-page a{color:#c0392b}
@media(prefers-color-scheme:dark){
body{background:#0f0f17;color:#e0e0e8}
.error-page p{color:#aaa}
.error-page a{color:#ff6b5b}
}
"#;

/// Content-Security-Policy header value.
///
/// Inline styles, the bundled timestamp script, HTTPS images only.
pub const CSP_HEADER: &str = "default-src 'none'; style-src 'unsafe-inline'; script-src 'self'; img-src https: data:; form-action 'self'; base-uri 'none'; frame-ancestors 'none'";

/// Per-request view of the feed being served.
#[derive(Debug, Clone)]
pub struct FeedContext {
    /// Site name from configuration.
    pub site_name: String,
    /// Path prefix of the feed (`""` for the default feed, `/f/{feed}` otherwise).
    pub prefix: String,
    /// Absolute base URL of the feed.
    pub base_url: String,
    /// Number of posts in the current index.
    pub article_count: usize,
}

impl FeedContext {
    /// Site-relative path inside this feed.
    pub fn path(&self, rest: &str) -> String {
        format!("{}{rest}", self.prefix)
    }

    /// Feed root, never empty.
    pub fn root(&self) -> String {
        if self.prefix.is_empty() {
            "/".to_string()
        } else {
            self.prefix.clone()
        }
    }

    /// `og:site_name` value: site name plus article count.
    pub fn og_site_name(&self) -> String {
        format!("{} \u{2022} {} articles", self.site_name, self.article_count)
    }
}

/// Open Graph metadata for a page.
pub struct OpenGraphData<'a> {
    /// OG title.
    pub title: &'a str,
    /// OG description.
    pub description: &'a str,
    /// OG type (e.g., "article", "website").
    pub og_type: &'a str,
    /// oEmbed discovery URL, for post pages.
    pub oembed: Option<&'a str>,
}

/// Render the full HTML page shell with `<head>`, OG tags, and body content.
pub fn page_shell(
    feed: &FeedContext,
    title: &str,
    canonical_url: &str,
    og: OpenGraphData<'_>,
    body_content: Markup,
) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - " (feed.site_name) }
                meta name="description" content=(og.description);
                link rel="canonical" href=(canonical_url);
                link rel="alternate" type="application/rss+xml"
                    title=(format!("{} RSS Feed", feed.site_name))
                    href=(format!("{}/feed.rss", feed.base_url));

                // Open Graph
                meta property="og:title" content=(og.title);
                meta property="og:description" content=(og.description);
                meta property="og:url" content=(canonical_url);
                meta property="og:site_name" content=(feed.og_site_name());
                meta property="og:type" content=(og.og_type);
                @if let Some(oembed) = og.oembed {
                    link type="application/json+oembed" href=(oembed);
                }

                style { (PreEscaped(PAGE_CSS)) }
                script src="/static/main.js" defer {}
            }
            body {
                header class="masthead" {
                    a class="masthead-title" href=(feed.root()) { (feed.site_name) }
                    form action=(feed.path("/search")) method="get" {
                        input type="text" name="query" placeholder="Search...";
                        input type="submit" value="Search";
                    }
                }
                main { (body_content) }
                footer class="footer" {
                    a href=(feed.path("/feed.rss")) { "RSS Feed" }
                }
            }
        }
    }
}

/// Render a listing card for one post.
pub fn post_card(feed: &FeedContext, post: &RenderedPost) -> Markup {
    html! {
        div class="newsPost" {
            (PreEscaped(&post.html))
            @if post.attachment_count > 0 {
                p class="post-meta" { (attachment_label(post.attachment_count)) }
            }
            p class="post-meta" {
                a href=(feed.path(&format!("/post/{}", post.source_id))) { "Link to post for sharing" }
            }
        }
    }
}

fn attachment_label(count: usize) -> String {
    if count == 1 {
        "1 attachment".to_string()
    } else {
        format!("{count} attachments")
    }
}

/// Previous/next links. `base` already carries any query string except
/// `page`.
pub fn pager(base: &str, page: i64, has_next: bool) -> Markup {
    let joiner = if base.contains('?') { '&' } else { '?' };
    html! {
        nav class="pager" {
            span {
                @if page > 1 {
                    a href=(format!("{base}{joiner}page={}", page - 1)) { "Previous Page" }
                }
            }
            span {
                @if has_next {
                    a href=(format!("{base}{joiner}page={}", page + 1)) { "Next Page" }
                }
            }
        }
    }
}
