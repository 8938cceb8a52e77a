//! Plaintext extraction of the document tree.
//!
//! Output is unescaped; callers escape before embedding it in markup.

use futures::future::{BoxFuture, join_all};

use super::html::mention_text;
use super::timestamp::format_timestamp;
use crate::ast::{Content, Node, Reference};
use crate::resolve::{EntityResolver, lookup_reference};

/// Renders nodes to plain text, siblings joined by a single space.
pub struct PlainRenderer<'a> {
    resolver: &'a dyn EntityResolver,
}

impl<'a> PlainRenderer<'a> {
    pub fn new(resolver: &'a dyn EntityResolver) -> Self {
        Self { resolver }
    }

    pub async fn render(&self, nodes: &[Node]) -> String {
        self.render_nodes(nodes).await
    }

    fn render_nodes<'b>(&'b self, nodes: &'b [Node]) -> BoxFuture<'b, String> {
        Box::pin(async move {
            join_all(nodes.iter().map(|node| self.render_node(node)))
                .await
                .join(" ")
        })
    }

    async fn render_content(&self, content: &Content) -> String {
        match content {
            Content::Text(text) => text.clone(),
            Content::Nodes(nodes) => self.render_nodes(nodes).await,
        }
    }

    async fn render_node(&self, node: &Node) -> String {
        match node {
            Node::Text(text) => text.clone(),
            Node::Link { content, .. }
            | Node::Url { content, .. }
            | Node::BlockQuote(content)
            | Node::CodeBlock { content, .. }
            | Node::InlineCode(content)
            | Node::Styled { content, .. }
            | Node::Emoticon(content) => self.render_content(content).await,
            Node::Br => "\n".to_string(),
            Node::Mention { reference, id } => {
                let name = lookup_reference(self.resolver, *reference, id).await;
                match name {
                    Some(name) => mention_text(*reference, id, Some(name.as_str())),
                    None => plain_fallback(*reference, id),
                }
            }
            Node::Broadcast(broadcast) => broadcast.label().to_string(),
            Node::Emoji { id: Some(_), .. } => String::new(),
            Node::Emoji { id: None, name, .. } => name.clone(),
            Node::Timestamp { timestamp, format } => format_timestamp(*timestamp, format),
            Node::Unknown { kind, content } => {
                let body = match content {
                    Some(content) => self.render_content(content).await,
                    None => String::new(),
                };
                format!("{kind}: {body}")
            }
        }
    }
}

/// Unresolved reference in plaintext: sigil plus raw id, no brackets.
fn plain_fallback(reference: Reference, id: &str) -> String {
    match reference {
        Reference::Channel => format!("#{id}"),
        Reference::Role | Reference::User => format!("@{id}"),
    }
}
