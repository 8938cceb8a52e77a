//! Chat-markdown document tree.
//!
//! Documents arrive already parsed: each message carries a JSON array of
//! nodes in the shape emitted by the chat-markdown parser
//! (`{"type": "strong", "content": [...]}`). This module turns that wire form
//! into a closed [`Node`] enum. Kinds this crate does not know about are kept
//! as [`Node::Unknown`] so newer markup still renders through the fallback
//! path instead of failing to parse.

use serde::Deserialize;

/// Payload of a container node: literal text or nested children.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Content {
    /// Terminal string content.
    Text(String),
    /// Ordered child nodes.
    Nodes(Vec<Node>),
}

impl Content {
    /// Empty child list, used when a container node arrives without content.
    pub fn empty() -> Self {
        Self::Nodes(Vec::new())
    }
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<Node>> for Content {
    fn from(nodes: Vec<Node>) -> Self {
        Self::Nodes(nodes)
    }
}

/// Inline styling wrappers that differ only in the emitted tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Em,
    Strong,
    Underline,
    Strikethrough,
    Spoiler,
}

impl Style {
    /// Wire name of this style.
    pub fn kind(self) -> &'static str {
        match self {
            Self::Em => "em",
            Self::Strong => "strong",
            Self::Underline => "underline",
            Self::Strikethrough => "strikethrough",
            Self::Spoiler => "spoiler",
        }
    }
}

/// Broadcast mentions that need no lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Broadcast {
    Here,
    Everyone,
}

impl Broadcast {
    /// Literal text shown for the mention.
    pub fn label(self) -> &'static str {
        match self {
            Self::Here => "@here",
            Self::Everyone => "@everyone",
        }
    }
}

/// Entity references resolved through an [`crate::EntityResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    Channel,
    Role,
    User,
}

/// A node of the parsed document tree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawNode")]
pub enum Node {
    /// Literal text.
    Text(String),
    /// Markdown link with an explicit target.
    Link { target: String, content: Content },
    /// Bare or angle-bracketed URL (`url` / `autolink`).
    Url { target: String, content: Content },
    BlockQuote(Content),
    /// `br` / `newline`.
    Br,
    /// Channel, role or user reference by opaque id.
    Mention { reference: Reference, id: String },
    Broadcast(Broadcast),
    CodeBlock { lang: Option<String>, content: Content },
    InlineCode(Content),
    Styled { style: Style, content: Content },
    Emoticon(Content),
    /// Custom (`id` present) or unicode (`id` absent) emoji.
    Emoji {
        id: Option<String>,
        name: String,
        animated: bool,
    },
    /// Unix-seconds instant with a single-character presentation code.
    Timestamp { timestamp: i64, format: String },
    /// Any kind this crate does not recognise.
    Unknown {
        kind: String,
        content: Option<Content>,
    },
}

impl Node {
    /// Text leaf.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Styling wrapper around children.
    pub fn styled(style: Style, children: Vec<Node>) -> Self {
        Self::Styled {
            style,
            content: Content::Nodes(children),
        }
    }

    /// Reference to a user id.
    pub fn user(id: impl Into<String>) -> Self {
        Self::Mention {
            reference: Reference::User,
            id: id.into(),
        }
    }

    /// Wire name of this node's kind.
    pub fn kind(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::Link { .. } => "link",
            Self::Url { .. } => "url",
            Self::BlockQuote(_) => "blockQuote",
            Self::Br => "br",
            Self::Mention { reference, .. } => match reference {
                Reference::Channel => "channel",
                Reference::Role => "role",
                Reference::User => "user",
            },
            Self::Broadcast(Broadcast::Here) => "here",
            Self::Broadcast(Broadcast::Everyone) => "everyone",
            Self::CodeBlock { .. } => "codeBlock",
            Self::InlineCode(_) => "inlineCode",
            Self::Styled { style, .. } => style.kind(),
            Self::Emoticon(_) => "emoticon",
            Self::Emoji { .. } => "emoji",
            Self::Timestamp { .. } => "timestamp",
            Self::Unknown { kind, .. } => kind,
        }
    }
}

/// Parse a JSON array of nodes.
#[cfg(test)]
pub(crate) fn parse_nodes(json: &str) -> serde_json::Result<Vec<Node>> {
    serde_json::from_str(json)
}

/// Timestamp field as emitted upstream: either a number or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
    Number(i64),
    Text(String),
}

/// Flat wire record covering every node kind's fields.
#[derive(Debug, Deserialize)]
struct RawNode {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    lang: Option<String>,
    #[serde(default)]
    animated: Option<bool>,
    #[serde(default)]
    timestamp: Option<RawTimestamp>,
    #[serde(default)]
    format: Option<String>,
}

/// Default presentation code when a timestamp carries none.
const DEFAULT_TIMESTAMP_FORMAT: &str = "f";

impl From<RawNode> for Node {
    fn from(raw: RawNode) -> Self {
        let RawNode {
            kind,
            content,
            target,
            id,
            name,
            lang,
            animated,
            timestamp,
            format,
        } = raw;

        match kind.as_str() {
            "text" => match content {
                Some(Content::Text(text)) => Node::Text(text),
                other => Node::Unknown {
                    kind,
                    content: other,
                },
            },
            "link" => Node::Link {
                target: target.unwrap_or_default(),
                content: content.unwrap_or_else(Content::empty),
            },
            "url" | "autolink" => Node::Url {
                target: target.unwrap_or_default(),
                content: content.unwrap_or_else(Content::empty),
            },
            "blockQuote" => Node::BlockQuote(content.unwrap_or_else(Content::empty)),
            "br" | "newline" => Node::Br,
            "channel" => mention(Reference::Channel, id, kind, content),
            "role" => mention(Reference::Role, id, kind, content),
            "user" => mention(Reference::User, id, kind, content),
            "here" => Node::Broadcast(Broadcast::Here),
            "everyone" => Node::Broadcast(Broadcast::Everyone),
            "codeBlock" => Node::CodeBlock {
                lang: lang.filter(|l| !l.is_empty()),
                content: content.unwrap_or_else(Content::empty),
            },
            "inlineCode" => Node::InlineCode(content.unwrap_or_else(Content::empty)),
            "em" => styled(Style::Em, content),
            "strong" => styled(Style::Strong, content),
            "underline" => styled(Style::Underline, content),
            "strikethrough" => styled(Style::Strikethrough, content),
            "spoiler" => styled(Style::Spoiler, content),
            "emoticon" => Node::Emoticon(content.unwrap_or_else(Content::empty)),
            "emoji" | "twemoji" => Node::Emoji {
                id: id.filter(|i| !i.is_empty()),
                name: name.unwrap_or_default(),
                animated: animated.unwrap_or(false),
            },
            "timestamp" => {
                let seconds = match timestamp {
                    Some(RawTimestamp::Number(n)) => Some(n),
                    Some(RawTimestamp::Text(s)) => s.trim().parse().ok(),
                    None => None,
                };
                match seconds {
                    Some(timestamp) => Node::Timestamp {
                        timestamp,
                        format: format.unwrap_or_else(|| DEFAULT_TIMESTAMP_FORMAT.to_string()),
                    },
                    None => Node::Unknown { kind, content },
                }
            }
            _ => Node::Unknown { kind, content },
        }
    }
}

fn mention(
    reference: Reference,
    id: Option<String>,
    kind: String,
    content: Option<Content>,
) -> Node {
    match id {
        Some(id) => Node::Mention { reference, id },
        None => Node::Unknown { kind, content },
    }
}

fn styled(style: Style, content: Option<Content>) -> Node {
    Node::Styled {
        style,
        content: content.unwrap_or_else(Content::empty),
    }
}
