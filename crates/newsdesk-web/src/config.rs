//! Application configuration loaded from environment variables.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono_tz::Tz;
use newsdesk_core::IndexOptions;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:3000").
    pub bind_addr: String,

    /// Public base URL, used in RSS links, canonical URLs and OG tags.
    pub base_url: String,

    /// Site name shown in page titles and feed metadata.
    pub site_name: String,

    /// Directory holding `<feed>.json` channel exports and `entities.json`.
    pub export_dir: PathBuf,

    /// Feed names; the first is served at the site root.
    pub feeds: Vec<String>,

    /// Source ids never shown on the site.
    pub blacklist: Arc<HashSet<String>>,

    /// Zone for byline dates.
    pub timezone: Tz,

    /// Bearer tokens accepted by `/notify`. Empty disables the endpoint.
    pub notify_tokens: Arc<HashSet<String>>,

    /// Periodic rebuild interval in seconds (0 = off).
    pub refresh_secs: u64,

    /// Upper bound for a single rebuild.
    pub rebuild_timeout_secs: u64,
}

fn comma_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_u64(key: &str, default: u64) -> anyhow::Result<u64> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a non-negative integer, got {value:?}")),
        _ => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - None (all have defaults for local development)
    ///
    /// Optional:
    /// - `NEWS_BIND_ADDR`: Server bind address (default: "0.0.0.0:3000")
    /// - `NEWS_BASE_URL`: Public base URL (default: "http://localhost:3000")
    /// - `NEWS_SITE_NAME`: Site name (default: "Newsdesk")
    /// - `NEWS_EXPORT_DIR`: Channel export directory (default: "./export")
    /// - `NEWS_FEEDS`: Comma-separated feed names (default: "news")
    /// - `NEWS_BLACKLIST`: Comma-separated source ids to hide
    /// - `NEWS_TIMEZONE`: IANA zone for bylines (default: "Europe/Berlin")
    /// - `NEWS_NOTIFY_TOKENS`: Comma-separated bearer tokens for `/notify`
    /// - `NEWS_REFRESH_SECS`: Periodic rebuild interval, 0 = off (default: 0)
    /// - `NEWS_REBUILD_TIMEOUT_SECS`: Rebuild timeout (default: 120)
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr =
            std::env::var("NEWS_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let base_url = std::env::var("NEWS_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .trim_end_matches('/')
            .to_string();

        let site_name = std::env::var("NEWS_SITE_NAME").unwrap_or_else(|_| "Newsdesk".to_string());

        let export_dir = PathBuf::from(
            std::env::var("NEWS_EXPORT_DIR").unwrap_or_else(|_| "./export".to_string()),
        );

        let mut feeds: Vec<String> = Vec::new();
        for feed in comma_list(&std::env::var("NEWS_FEEDS").unwrap_or_default()) {
            anyhow::ensure!(
                feed.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
                "feed name {feed:?} may only contain ASCII letters, digits, '-' and '_'"
            );
            if !feeds.contains(&feed) {
                feeds.push(feed);
            }
        }
        if feeds.is_empty() {
            feeds.push("news".to_string());
        }

        let blacklist: HashSet<String> =
            comma_list(&std::env::var("NEWS_BLACKLIST").unwrap_or_default()).collect();

        let timezone_name =
            std::env::var("NEWS_TIMEZONE").unwrap_or_else(|_| "Europe/Berlin".to_string());
        let timezone: Tz = timezone_name
            .parse()
            .map_err(|err| anyhow::anyhow!("invalid NEWS_TIMEZONE {timezone_name:?}: {err}"))?;

        let notify_tokens: HashSet<String> =
            comma_list(&std::env::var("NEWS_NOTIFY_TOKENS").unwrap_or_default()).collect();

        let refresh_secs = env_u64("NEWS_REFRESH_SECS", 0)?;
        let rebuild_timeout_secs = env_u64("NEWS_REBUILD_TIMEOUT_SECS", 120)?.max(1);

        tracing::info!(
            bind_addr = %bind_addr,
            base_url = %base_url,
            site_name = %site_name,
            export_dir = %export_dir.display(),
            feeds = ?feeds,
            blacklist_count = blacklist.len(),
            timezone = %timezone,
            notify_enabled = !notify_tokens.is_empty(),
            refresh_secs,
            "newsdesk configuration loaded"
        );

        Ok(Self {
            bind_addr,
            base_url,
            site_name,
            export_dir,
            feeds,
            blacklist: Arc::new(blacklist),
            timezone,
            notify_tokens: Arc::new(notify_tokens),
            refresh_secs,
            rebuild_timeout_secs,
        })
    }

    /// Feed served at the site root.
    pub fn default_feed(&self) -> &str {
        self.feeds.first().map(String::as_str).unwrap_or("news")
    }

    /// Index rebuild settings.
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            timezone: self.timezone,
            blacklist: self.blacklist.as_ref().clone(),
        }
    }

    pub fn rebuild_timeout(&self) -> Duration {
        Duration::from_secs(self.rebuild_timeout_secs)
    }

    /// Base URL of a feed: the site root for the default feed,
    /// `/f/{feed}` otherwise.
    pub fn feed_base_url(&self, feed: &str) -> String {
        if feed == self.default_feed() {
            self.base_url.clone()
        } else {
            format!("{}/f/{feed}", self.base_url)
        }
    }
}
