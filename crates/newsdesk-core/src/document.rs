//! Upstream channel documents and backwards history paging.

use std::cmp::Ordering;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ast::Node;
use crate::error::Result;

/// Page size used when walking a channel's history.
pub const HISTORY_PAGE_LIMIT: usize = 100;

/// Bodies the platform leaves behind for removed messages.
pub const TOMBSTONES: &[&str] = &["[deleted]", "[original message deleted]"];

/// Author of a channel message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Author {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub username: String,
}

impl Author {
    /// Display name, falling back to the username.
    pub fn name(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.username)
    }
}

/// File attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Attachment {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl Attachment {
    /// URL to embed, preferring the media proxy.
    pub fn display_url(&self) -> &str {
        self.proxy_url.as_deref().unwrap_or(&self.url)
    }
}

/// A channel message with its externally parsed markdown tree.
#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    /// Snowflake id, also the post id on the site.
    pub id: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    pub author: Author,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub edited_at: Option<DateTime<Utc>>,
    /// Raw message text.
    pub content: String,
    #[serde(default)]
    pub ast: Vec<Node>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl Document {
    /// Whether this is a removed-message placeholder.
    pub fn is_tombstone(&self) -> bool {
        TOMBSTONES.contains(&self.content.as_str())
    }
}

/// Order snowflake ids numerically without parsing: shorter is smaller.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Paged access to a channel's message history.
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Channel this source pages through, for logging and errors.
    fn channel(&self) -> &str;

    /// Up to `limit` documents strictly older than `before` (newest first),
    /// or the newest documents when `before` is `None`. An empty page ends
    /// the history.
    async fn fetch_history_page(
        &self,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Document>>;
}

/// Walk the whole history backwards and return it oldest first.
pub async fn fetch_all_history<S: HistorySource + ?Sized>(source: &S) -> Result<Vec<Document>> {
    let mut pages: Vec<Vec<Document>> = Vec::new();
    let mut before: Option<String> = None;

    loop {
        let page = source
            .fetch_history_page(before.as_deref(), HISTORY_PAGE_LIMIT)
            .await?;
        let Some(oldest) = page
            .iter()
            .map(|doc| doc.id.as_str())
            .min_by(|a, b| compare_ids(a, b))
        else {
            break;
        };
        if let Some(previous) = before.as_deref()
            && compare_ids(oldest, previous) != Ordering::Less
        {
            tracing::warn!(
                channel = source.channel(),
                before = previous,
                "history page did not move backwards, stopping"
            );
            break;
        }
        tracing::debug!(
            channel = source.channel(),
            before = before.as_deref().unwrap_or("-"),
            count = page.len(),
            "fetched history page"
        );
        before = Some(oldest.to_string());
        pages.push(page);
    }

    let mut documents: Vec<Document> = pages
        .into_iter()
        .rev()
        .flat_map(|page| page.into_iter().rev())
        .collect();
    documents.dedup_by(|a, b| a.id == b.id);
    Ok(documents)
}

/// In-memory history, newest first by id.
#[derive(Debug, Clone, Default)]
pub struct VecHistory {
    channel: String,
    documents: Vec<Document>,
}

impl VecHistory {
    pub fn new(channel: impl Into<String>, mut documents: Vec<Document>) -> Self {
        documents.sort_by(|a, b| compare_ids(&b.id, &a.id));
        Self {
            channel: channel.into(),
            documents,
        }
    }
}

#[async_trait]
impl HistorySource for VecHistory {
    fn channel(&self) -> &str {
        &self.channel
    }

    async fn fetch_history_page(
        &self,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Document>> {
        Ok(self
            .documents
            .iter()
            .filter(|doc| before.is_none_or(|b| compare_ids(&doc.id, b) == Ordering::Less))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

    use chrono::TimeZone;

    use super::*;
    use crate::error::Error;

    /// Document created `secs` seconds after a fixed epoch.
    pub(crate) fn doc(id: &str, secs: i64, content: &str) -> Document {
        Document {
            id: id.to_string(),
            channel_id: Some("news".to_string()),
            author: Author {
                id: "300".to_string(),
                display_name: Some("Ada".to_string()),
                username: "ada".to_string(),
            },
            created_at: Utc
                .timestamp_opt(1_700_000_000 + secs, 0)
                .single()
                .unwrap(),
            edited_at: None,
            content: content.to_string(),
            ast: vec![Node::text(content)],
            attachments: Vec::new(),
        }
    }

    /// History that fails on the n-th page request.
    pub(crate) struct FlakyHistory {
        pub(crate) inner: VecHistory,
        pub(crate) fail_on: usize,
        pub(crate) calls: AtomicUsize,
    }

    #[async_trait]
    impl HistorySource for FlakyHistory {
        fn channel(&self) -> &str {
            self.inner.channel()
        }

        async fn fetch_history_page(
            &self,
            before: Option<&str>,
            limit: usize,
        ) -> Result<Vec<Document>> {
            let call = self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            if call == self.fail_on {
                return Err(Error::History {
                    channel: self.channel().to_string(),
                    reason: "gateway timeout".to_string(),
                });
            }
            self.inner.fetch_history_page(before, limit).await
        }
    }

    #[test]
    fn snowflake_order() {
        assert_eq!(compare_ids("99", "100"), Ordering::Less);
        assert_eq!(compare_ids("200", "100"), Ordering::Greater);
        assert_eq!(compare_ids("7", "7"), Ordering::Equal);
    }

    #[test]
    fn tombstones() {
        assert!(doc("1", 0, "[deleted]").is_tombstone());
        assert!(doc("1", 0, "[original message deleted]").is_tombstone());
        assert!(!doc("1", 0, "deleted").is_tombstone());
        assert!(!doc("1", 0, "[deleted] ").is_tombstone());
        assert!(!doc("1", 0, " [original message deleted]").is_tombstone());
    }

    #[test]
    fn author_name_fallback() {
        let mut author = doc("1", 0, "x").author;
        assert_eq!(author.name(), "Ada");
        author.display_name = None;
        assert_eq!(author.name(), "ada");
    }

    #[test]
    fn document_from_json() {
        let json = r#"{
            "id": "123",
            "author": {"id": "1", "username": "grace"},
            "created_at": "2024-05-01T12:00:00Z",
            "content": "hi",
            "ast": [{"type": "text", "content": "hi"}],
            "attachments": [{"url": "https://cdn.example/a.png"}]
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        assert_eq!(document.author.name(), "grace");
        assert_eq!(document.ast, vec![Node::text("hi")]);
        assert_eq!(document.attachments[0].display_url(), "https://cdn.example/a.png");
        assert!(document.edited_at.is_none());
    }

    #[tokio::test]
    async fn pages_backwards_until_empty() {
        let documents: Vec<Document> = (1..=250)
            .map(|i| doc(&i.to_string(), i, &format!("post {i}")))
            .collect();
        let history = VecHistory::new("news", documents);

        let first = history.fetch_history_page(None, 100).await.unwrap();
        assert_eq!(first.len(), 100);
        assert_eq!(first[0].id, "250");

        let all = fetch_all_history(&history).await.unwrap();
        assert_eq!(all.len(), 250);
        assert_eq!(all.first().unwrap().id, "1");
        assert_eq!(all.last().unwrap().id, "250");
    }

    #[tokio::test]
    async fn empty_history() {
        let history = VecHistory::new("news", Vec::new());
        assert!(fetch_all_history(&history).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failure_mid_walk_propagates() {
        let documents: Vec<Document> = (1..=150).map(|i| doc(&i.to_string(), i, "x")).collect();
        let flaky = FlakyHistory {
            inner: VecHistory::new("news", documents),
            fail_on: 1,
            calls: AtomicUsize::new(0),
        };
        let err = fetch_all_history(&flaky).await.unwrap_err();
        assert!(matches!(err, Error::History { .. }));
    }
}
