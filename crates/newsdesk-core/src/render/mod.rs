//! Tree-walking renderers for chat-markdown documents.
//!
//! Two traversals share the same shape:
//! - [`HtmlRenderer`] produces escaped HTML fragments with sibling results
//!   joined by [`SEPARATOR`].
//! - [`PlainRenderer`] produces unescaped text with siblings joined by a
//!   single space, for titles, summaries and search.
//!
//! Both suspend only at resolver lookups. Siblings are rendered
//! concurrently and assembled in source order.

mod html;
mod plain;
pub mod timestamp;

pub use html::HtmlRenderer;
pub use plain::PlainRenderer;

use crate::ast::Node;
use crate::postprocess::{minify_whitespace, promote_headings};
use crate::resolve::EntityResolver;

/// Sibling boundary marker in raw HTML renderer output (private use).
pub const SEPARATOR: char = '\u{E000}';

/// Only absolute http(s) URLs become links.
pub fn is_safe_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Image sources must be HTTPS; the page policy blocks plain-http images.
pub fn is_safe_image_url(url: &str) -> bool {
    url.starts_with("https://")
}

/// Render a document body to final HTML.
///
/// Runs the HTML renderer, promotes headings (which also removes sibling
/// separators) and collapses whitespace.
pub async fn render_body(nodes: &[Node], resolver: &dyn EntityResolver) -> String {
    let raw = HtmlRenderer::new(resolver).render(nodes).await;
    minify_whitespace(&promote_headings(&raw))
}

/// Render a document body to plaintext.
pub async fn render_plain(nodes: &[Node], resolver: &dyn EntityResolver) -> String {
    PlainRenderer::new(resolver).render(nodes).await
}
