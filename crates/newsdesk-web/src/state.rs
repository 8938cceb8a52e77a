//! Application state shared across all request handlers.

use std::collections::HashMap;
use std::sync::Arc;

use moka::future::Cache;
use newsdesk_core::slot::timed_out;
use newsdesk_core::{EntityResolver, IndexSlot, RebuildOutcome};

use crate::config::Config;
use crate::error::SiteError;
use crate::export::ExportSource;

/// Rendered pages keyed by [`cache_key`].
pub type HtmlCache = Cache<String, String>;

/// Default cache capacity (number of entries).
const DEFAULT_CACHE_CAPACITY: u64 = 10_000;

/// Default cache TTL. Keys carry the index version, so this only bounds
/// memory held by pages nobody asks for anymore.
const DEFAULT_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(300);

/// One served channel: its index slot and its upstream.
#[derive(Debug)]
pub struct Feed {
    pub name: String,
    pub slot: IndexSlot,
    pub source: ExportSource,
}

/// Shared application state available to all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,

    /// Feeds by name.
    pub feeds: Arc<HashMap<String, Arc<Feed>>>,

    /// Entity names for channel, role, user and emoji references.
    pub resolver: Arc<dyn EntityResolver>,

    /// In-memory HTML response cache keyed by feed, index version and route.
    pub cache: HtmlCache,
}

impl AppState {
    /// Create a new application state from configuration.
    ///
    /// Every feed starts with an empty index; call [`AppState::refresh_all`]
    /// to populate them.
    pub fn new(config: Config, resolver: Arc<dyn EntityResolver>) -> Self {
        let feeds: HashMap<String, Arc<Feed>> = config
            .feeds
            .iter()
            .map(|name| {
                let feed = Feed {
                    name: name.clone(),
                    slot: IndexSlot::new(name.clone()),
                    source: ExportSource::new(&config.export_dir, name),
                };
                (name.clone(), Arc::new(feed))
            })
            .collect();

        let cache = Cache::builder()
            .max_capacity(DEFAULT_CACHE_CAPACITY)
            .time_to_live(DEFAULT_CACHE_TTL)
            .build();

        tracing::info!(
            feeds = feeds.len(),
            cache_capacity = DEFAULT_CACHE_CAPACITY,
            cache_ttl_secs = DEFAULT_CACHE_TTL.as_secs(),
            "application state initialized"
        );

        Self {
            config: Arc::new(config),
            feeds: Arc::new(feeds),
            resolver,
            cache,
        }
    }

    /// Look up a feed by name.
    pub fn feed(&self, name: &str) -> Option<Arc<Feed>> {
        self.feeds.get(name).cloned()
    }

    /// Rebuild one feed, bounded by the configured timeout.
    pub async fn rebuild_feed(&self, feed: &Feed) -> Result<RebuildOutcome, SiteError> {
        let options = self.config.index_options();
        let rebuild = feed
            .slot
            .request_rebuild(&feed.source, &*self.resolver, &options);

        match tokio::time::timeout(self.config.rebuild_timeout(), rebuild).await {
            Ok(Ok(outcome)) => {
                if let RebuildOutcome::Rebuilt(version) = outcome {
                    tracing::info!(feed = %feed.name, version, "feed rebuilt");
                    self.cache.invalidate_all();
                }
                Ok(outcome)
            }
            Ok(Err(err)) => Err(err.into()),
            Err(_) => {
                tracing::warn!(
                    feed = %feed.name,
                    timeout_secs = self.config.rebuild_timeout_secs,
                    "rebuild timed out, keeping previous index"
                );
                Err(timed_out(&feed.name, self.config.rebuild_timeout_secs).into())
            }
        }
    }

    /// Rebuild every feed in configuration order, logging failures.
    pub async fn refresh_all(&self) {
        for name in &self.config.feeds {
            let Some(feed) = self.feed(name) else {
                continue;
            };
            if let Err(err) = self.rebuild_feed(&feed).await {
                tracing::warn!(feed = %name, error = %err, "feed refresh failed");
            }
        }
    }
}

/// Cache key for a rendered page.
pub fn cache_key(feed: &str, version: u64, route: &str) -> String {
    format!("{feed}@{version}:{route}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::export::tests::{TempDir, message_json, write_export};
    use newsdesk_core::MapResolver;

    fn state_for(dir: &TempDir, feeds: &[&str]) -> AppState {
        AppState::new(
            test_config(dir.0.clone(), feeds),
            Arc::new(MapResolver::default()),
        )
    }

    #[tokio::test]
    async fn feeds_start_empty() {
        let dir = TempDir::new("state-empty");
        let state = state_for(&dir, &["news", "updates"]);
        assert_eq!(state.feeds.len(), 2);
        let feed = state.feed("updates").unwrap();
        assert_eq!(feed.slot.version(), 0);
        assert!(state.feed("missing").is_none());
    }

    #[tokio::test]
    async fn rebuild_installs_new_version() {
        let dir = TempDir::new("state-rebuild");
        write_export(&dir.0, "news", vec![message_json("1", "2024-01-01T00:00:00Z", "hi")]);
        let state = state_for(&dir, &["news"]);
        let feed = state.feed("news").unwrap();
        let outcome = state.rebuild_feed(&feed).await.unwrap();
        assert_eq!(outcome, RebuildOutcome::Rebuilt(1));
        assert_eq!(feed.slot.current().len(), 1);
    }

    #[tokio::test]
    async fn failed_rebuild_is_unavailable() {
        let dir = TempDir::new("state-fail");
        let state = state_for(&dir, &["news"]);
        let feed = state.feed("news").unwrap();
        let err = state.rebuild_feed(&feed).await.unwrap_err();
        assert!(matches!(err, SiteError::Unavailable(_)));
        assert_eq!(feed.slot.version(), 0);
    }

    #[tokio::test]
    async fn refresh_all_keeps_going_after_failure() {
        let dir = TempDir::new("state-refresh");
        write_export(&dir.0, "updates", vec![message_json("1", "2024-01-01T00:00:00Z", "hi")]);
        let state = state_for(&dir, &["news", "updates"]);
        state.refresh_all().await;
        assert_eq!(state.feed("news").unwrap().slot.version(), 0);
        assert_eq!(state.feed("updates").unwrap().slot.version(), 1);
    }

    #[test]
    fn cache_keys_include_version() {
        assert_ne!(cache_key("news", 1, "/"), cache_key("news", 2, "/"));
        assert_ne!(cache_key("news", 1, "/"), cache_key("updates", 1, "/"));
    }
}
