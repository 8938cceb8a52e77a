//! RSS and sitemap documents.
//!
//! maud writes the markup; the XML prolog and namespaced attributes are
//! added around it since maud only knows HTML doctypes.

use maud::{PreEscaped, html};
use newsdesk_core::DocumentIndex;
use newsdesk_core::output::{rss_items, sitemap_entries};
use newsdesk_core::postprocess::escape_html;

use super::components::FeedContext;

const XML_PROLOG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// RSS 2.0 document for one feed.
pub fn rss(
    feed: &FeedContext,
    index: &DocumentIndex,
    limit: Option<usize>,
    page: Option<i64>,
) -> String {
    let self_url = format!("{}/feed.rss", feed.base_url);
    let items = rss_items(index, &feed.base_url, limit, page);
    let channel = html! {
        channel {
            title { (feed.site_name) }
            description { (feed.site_name) " RSS Feed" }
            link { (feed.base_url) }
            docs { "https://www.rssboard.org/rss-specification" }
            (PreEscaped(format!(
                r#"<atom:link href="{}" rel="self" type="application/rss+xml" />"#,
                escape_html(&self_url)
            )))
            @for item in &items {
                (PreEscaped(item))
            }
        }
    };
    format!(
        r#"{XML_PROLOG}<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">{}</rss>"#,
        channel.into_string()
    )
}

/// Sitemap listing the feed root and every post.
pub fn sitemap(feed: &FeedContext, index: &DocumentIndex) -> String {
    let entries = sitemap_entries(index, &feed.base_url);
    let urls = html! {
        url { loc { (feed.base_url) "/" } }
        @for entry in &entries {
            url {
                loc { (entry.loc) }
                lastmod { (entry.lastmod) }
            }
        }
    };
    format!(
        r#"{XML_PROLOG}<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        urls.into_string()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::components::tests::context;
    use crate::render::tests::index_of;

    #[tokio::test]
    async fn rss_channel_and_items() {
        let index = index_of(&[("1", "alpha"), ("2", "beta")]).await;
        let xml = rss(&context(""), &index, None, None);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?><rss version=\"2.0\""));
        assert!(xml.contains("<title>Test News</title>"));
        assert!(xml.contains(
            "<atom:link href=\"https://news.example/feed.rss\" rel=\"self\" type=\"application/rss+xml\" />"
        ));
        assert_eq!(xml.matches("<item>").count(), 2);
        assert!(xml.contains("<link>https://news.example/post/2</link>"));
        assert!(xml.ends_with("</channel></rss>"));
    }

    #[tokio::test]
    async fn rss_limit_and_page() {
        let index = index_of(&[("1", "alpha"), ("2", "beta"), ("3", "gamma")]).await;
        let xml = rss(&context(""), &index, Some(2), Some(2));
        assert_eq!(xml.matches("<item>").count(), 1);
        assert!(xml.contains("<guid isPermaLink=\"false\">1</guid>"));
    }

    #[tokio::test]
    async fn sitemap_lists_posts() {
        let index = index_of(&[("1", "alpha")]).await;
        let xml = sitemap(&context("/f/updates"), &index);
        assert!(xml.contains("<url><loc>https://news.example/f/updates/</loc></url>"));
        assert!(xml.contains("<loc>https://news.example/f/updates/post/1</loc>"));
        assert!(xml.contains("<lastmod>"));
    }
}
