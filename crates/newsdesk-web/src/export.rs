//! File-backed channel exports.
//!
//! Each feed reads `<export_dir>/<feed>.json`:
//!
//! ```json
//! {"messages": [{"id": "…", "author": {…}, "created_at": "…", "content": "…", "ast": […]}]}
//! ```
//!
//! and entity names come from `<export_dir>/entities.json`, a
//! [`MapResolver`] in JSON form. The export file is re-read at the start of
//! every history walk, so a change notification picks up new content.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use newsdesk_core::{Document, Error as CoreError, HistorySource, MapResolver, VecHistory};
use serde::Deserialize;

/// Export file name holding entity display names.
pub const ENTITIES_FILE: &str = "entities.json";

#[derive(Debug, Deserialize)]
struct ExportFile {
    #[serde(default)]
    messages: Vec<Document>,
}

/// History source reading one feed's export file.
#[derive(Debug)]
pub struct ExportSource {
    feed: String,
    path: PathBuf,
    snapshot: Mutex<Arc<VecHistory>>,
}

impl ExportSource {
    pub fn new(export_dir: &Path, feed: &str) -> Self {
        Self {
            feed: feed.to_string(),
            path: export_dir.join(format!("{feed}.json")),
            snapshot: Mutex::new(Arc::new(VecHistory::default())),
        }
    }

    async fn load(&self) -> Result<VecHistory, CoreError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| self.history_error(format!("{}: {err}", self.path.display())))?;
        let export: ExportFile = serde_json::from_str(&raw)
            .map_err(|err| self.history_error(format!("{}: {err}", self.path.display())))?;
        tracing::debug!(
            feed = %self.feed,
            messages = export.messages.len(),
            "export loaded"
        );
        Ok(VecHistory::new(self.feed.clone(), export.messages))
    }

    fn history_error(&self, reason: String) -> CoreError {
        CoreError::History {
            channel: self.feed.clone(),
            reason,
        }
    }

    fn snapshot(&self) -> Arc<VecHistory> {
        self.snapshot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl HistorySource for ExportSource {
    fn channel(&self) -> &str {
        &self.feed
    }

    async fn fetch_history_page(
        &self,
        before: Option<&str>,
        limit: usize,
    ) -> Result<Vec<Document>, CoreError> {
        // The first page of a walk takes a fresh snapshot of the file.
        if before.is_none() {
            let fresh = Arc::new(self.load().await?);
            *self.snapshot.lock().unwrap_or_else(PoisonError::into_inner) = fresh;
        }
        self.snapshot().fetch_history_page(before, limit).await
    }
}

/// Load entity names, falling back to an empty resolver when the file is
/// absent.
pub async fn load_entities(export_dir: &Path) -> anyhow::Result<MapResolver> {
    let path = export_dir.join(ENTITIES_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(raw) => {
            let resolver: MapResolver = serde_json::from_str(&raw)
                .map_err(|err| anyhow::anyhow!("{}: {err}", path.display()))?;
            tracing::info!(
                channels = resolver.channels.len(),
                roles = resolver.roles.len(),
                users = resolver.users.len(),
                emojis = resolver.emojis.len(),
                "entity names loaded"
            );
            Ok(resolver)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(path = %path.display(), "no entity file, references fall back to raw ids");
            Ok(MapResolver::default())
        }
        Err(err) => Err(anyhow::anyhow!("{}: {err}", path.display())),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use newsdesk_core::{IndexOptions, rebuild};

    /// Scratch directory under the system temp dir, removed on drop.
    pub(crate) struct TempDir(pub(crate) PathBuf);

    impl TempDir {
        pub(crate) fn new(name: &str) -> Self {
            let dir = std::env::temp_dir().join(format!(
                "newsdesk-{name}-{}-{}",
                std::process::id(),
                chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
            ));
            std::fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }
    }

    impl Drop for TempDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.0);
        }
    }

    /// JSON for one exported message with a single text node.
    pub(crate) fn message_json(id: &str, created_at: &str, content: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "author": {"id": "1", "display_name": "Ada", "username": "ada"},
            "created_at": created_at,
            "content": content,
            "ast": [{"type": "text", "content": content}],
            "attachments": []
        })
    }

    pub(crate) fn write_export(dir: &Path, feed: &str, messages: Vec<serde_json::Value>) {
        let body = serde_json::json!({ "messages": messages });
        std::fs::write(dir.join(format!("{feed}.json")), body.to_string()).unwrap();
    }

    #[tokio::test]
    async fn reads_export_file() {
        let dir = TempDir::new("export-read");
        write_export(
            &dir.0,
            "news",
            vec![
                message_json("1", "2024-01-01T10:00:00Z", "first"),
                message_json("2", "2024-01-02T10:00:00Z", "second"),
            ],
        );
        let source = ExportSource::new(&dir.0, "news");
        let index = rebuild(&source, &MapResolver::default(), &IndexOptions::default())
            .await
            .unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.posts()[0].source_id, "2");
    }

    #[tokio::test]
    async fn rereads_after_change() {
        let dir = TempDir::new("export-reread");
        write_export(&dir.0, "news", vec![message_json("1", "2024-01-01T10:00:00Z", "a")]);
        let source = ExportSource::new(&dir.0, "news");
        let resolver = MapResolver::default();
        let options = IndexOptions::default();
        assert_eq!(rebuild(&source, &resolver, &options).await.unwrap().len(), 1);

        write_export(
            &dir.0,
            "news",
            vec![
                message_json("1", "2024-01-01T10:00:00Z", "a"),
                message_json("2", "2024-01-01T11:00:00Z", "b"),
            ],
        );
        assert_eq!(rebuild(&source, &resolver, &options).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn missing_export_is_history_error() {
        let dir = TempDir::new("export-missing");
        let source = ExportSource::new(&dir.0, "news");
        let err = source.fetch_history_page(None, 100).await.unwrap_err();
        assert!(matches!(err, CoreError::History { ref channel, .. } if channel == "news"));
    }

    #[tokio::test]
    async fn malformed_export_is_history_error() {
        let dir = TempDir::new("export-bad");
        std::fs::write(dir.0.join("news.json"), "{not json").unwrap();
        let source = ExportSource::new(&dir.0, "news");
        assert!(source.fetch_history_page(None, 100).await.is_err());
    }

    #[tokio::test]
    async fn entities_optional() {
        let dir = TempDir::new("entities");
        let empty = load_entities(&dir.0).await.unwrap();
        assert!(empty.users.is_empty());

        std::fs::write(
            dir.0.join(ENTITIES_FILE),
            r#"{"users":{"5":"Grace"},"channels":{"6":"general"}}"#,
        )
        .unwrap();
        let loaded = load_entities(&dir.0).await.unwrap();
        assert_eq!(loaded.users.get("5").map(String::as_str), Some("Grace"));
        assert_eq!(loaded.channels.len(), 1);
    }
}
