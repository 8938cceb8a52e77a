//! HTML rendering of the document tree.

use futures::future::{BoxFuture, join_all};
use maud::{PreEscaped, html};

use super::timestamp::{format_timestamp, iso_utc};
use super::{SEPARATOR, is_safe_image_url, is_safe_url};
use crate::ast::{Content, Node, Reference, Style};
use crate::postprocess::{LINE_BREAK, escape_html};
use crate::resolve::{EntityResolver, lookup_emoji, lookup_reference};

/// Renders nodes to HTML, resolving references through `resolver`.
///
/// Output still contains sibling separators; see
/// [`crate::postprocess::promote_headings`].
pub struct HtmlRenderer<'a> {
    resolver: &'a dyn EntityResolver,
}

impl<'a> HtmlRenderer<'a> {
    pub fn new(resolver: &'a dyn EntityResolver) -> Self {
        Self { resolver }
    }

    /// Render a sibling sequence.
    pub async fn render(&self, nodes: &[Node]) -> String {
        self.render_nodes(nodes).await
    }

    fn render_nodes<'b>(&'b self, nodes: &'b [Node]) -> BoxFuture<'b, String> {
        Box::pin(async move {
            let parts = join_all(nodes.iter().map(|node| self.render_node(node))).await;
            let mut out = String::new();
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    out.push(SEPARATOR);
                }
                out.push_str(part);
            }
            out
        })
    }

    async fn render_content(&self, content: &Content) -> String {
        match content {
            Content::Text(text) => escape_html(text),
            Content::Nodes(nodes) => self.render_nodes(nodes).await,
        }
    }

    async fn render_node(&self, node: &Node) -> String {
        match node {
            Node::Text(text) => escape_html(text),
            Node::Link { target, content } => {
                let body = self.render_content(content).await;
                if !is_safe_url(target) {
                    return body;
                }
                let markup = html! { a href=(target) { (PreEscaped(body)) } };
                markup.into_string()
            }
            Node::Url { target, content } => {
                let body = self.render_content(content).await;
                if !is_safe_url(target) {
                    return body;
                }
                let markup = html! {
                    a href=(target) target="_blank" rel="noopener noreferrer" { (PreEscaped(body)) }
                };
                markup.into_string()
            }
            Node::BlockQuote(content) => {
                let body = self.render_content(content).await;
                let markup = html! { blockquote { (PreEscaped(body)) } };
                markup.into_string()
            }
            Node::Br => LINE_BREAK.to_string(),
            Node::Mention { reference, id } => {
                let name = lookup_reference(self.resolver, *reference, id).await;
                escape_html(&mention_text(*reference, id, name.as_deref()))
            }
            Node::Broadcast(broadcast) => broadcast.label().to_string(),
            Node::CodeBlock { lang, content } => {
                let body = self.render_content(content).await;
                let markup = html! {
                    pre data-lang=[lang.as_deref()] { code { (PreEscaped(body)) } }
                };
                markup.into_string()
            }
            Node::InlineCode(content) => {
                let body = self.render_content(content).await;
                let markup = html! { code { (PreEscaped(body)) } };
                markup.into_string()
            }
            Node::Styled { style, content } => {
                let body = PreEscaped(self.render_content(content).await);
                let markup = match style {
                    Style::Em => html! { i { (body) } },
                    Style::Strong => html! { b { (body) } },
                    Style::Underline => html! { u { (body) } },
                    Style::Strikethrough => html! { s { (body) } },
                    Style::Spoiler => html! { span.spoiler { (body) } },
                };
                markup.into_string()
            }
            Node::Emoticon(content) => self.render_content(content).await,
            Node::Emoji { id, name, animated } => match id {
                None => escape_html(name),
                Some(id) => {
                    let src = match lookup_emoji(self.resolver, id).await {
                        Some(url) if is_safe_image_url(&url) => url,
                        _ => cdn_emoji_url(id, *animated),
                    };
                    let markup = html! { img.emoji src=(src) alt=(format!(":{name}:")); };
                    markup.into_string()
                }
            },
            Node::Timestamp { timestamp, format } => {
                let text = format_timestamp(*timestamp, format);
                let Some(iso) = iso_utc(*timestamp) else {
                    return escape_html(&text);
                };
                let markup = html! { time datetime=(iso) data-format=(format) { (text) } };
                markup.into_string()
            }
            Node::Unknown { kind, content } => {
                let body = match content {
                    Some(content) => self.render_content(content).await,
                    None => String::new(),
                };
                format!("{}: {body}", escape_html(kind))
            }
        }
    }
}

/// Display text for a reference, or its literal wire form when unresolved.
pub(super) fn mention_text(reference: Reference, id: &str, name: Option<&str>) -> String {
    match (reference, name) {
        (Reference::Channel, Some(name)) => format!("#{name}"),
        (Reference::Role | Reference::User, Some(name)) => format!("@{name}"),
        (Reference::Channel, None) => format!("<#{id}>"),
        (Reference::Role, None) => format!("<@&{id}>"),
        (Reference::User, None) => format!("<@{id}>"),
    }
}

/// Deterministic CDN location of a custom emoji image.
fn cdn_emoji_url(id: &str, animated: bool) -> String {
    let ext = if animated { "gif" } else { "png" };
    format!("https://cdn.discordapp.com/emojis/{id}.{ext}")
}
