//! Versioned index slot with single-flight rebuilds.
//!
//! Readers take a cheap `Arc` snapshot of the current index. Rebuild
//! requests that arrive while a rebuild is running only mark the slot
//! dirty; the running rebuild then goes around once more, so at most one
//! rebuild per channel is ever in flight and the last notification is
//! always reflected.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::Mutex;

use crate::document::HistorySource;
use crate::error::{Error, Result};
use crate::index::{DocumentIndex, IndexOptions, rebuild};
use crate::resolve::EntityResolver;

/// What a rebuild request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// This caller ran the rebuild; the slot now holds this version.
    Rebuilt(u64),
    /// Another caller is rebuilding and will pick the request up.
    Queued,
}

/// Holder of one channel's current index.
pub struct IndexSlot {
    channel: String,
    current: RwLock<Arc<DocumentIndex>>,
    pending: AtomicBool,
    running: Mutex<()>,
}

impl IndexSlot {
    /// Empty slot at version 0.
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            current: RwLock::new(Arc::new(DocumentIndex::empty())),
            pending: AtomicBool::new(false),
            running: Mutex::new(()),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Snapshot of the current index.
    pub fn current(&self) -> Arc<DocumentIndex> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn version(&self) -> u64 {
        self.current().version()
    }

    /// Whether a rebuild is running right now.
    pub fn is_rebuilding(&self) -> bool {
        self.running.try_lock().is_err()
    }

    fn install(&self, index: DocumentIndex) -> u64 {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let version = current.version() + 1;
        *current = Arc::new(index.with_version(version));
        version
    }

    /// Rebuild the index, coalescing with any rebuild already running.
    ///
    /// On failure the previous index stays in place and the error is
    /// returned to the caller that ran the rebuild.
    pub async fn request_rebuild<S: HistorySource + ?Sized>(
        &self,
        source: &S,
        resolver: &dyn EntityResolver,
        options: &IndexOptions,
    ) -> Result<RebuildOutcome> {
        self.pending.store(true, Ordering::SeqCst);
        let mut last: Option<Result<u64>> = None;

        loop {
            {
                let Ok(_running) = self.running.try_lock() else {
                    tracing::debug!(channel = %self.channel, "rebuild already running, queued");
                    break;
                };
                while self.pending.swap(false, Ordering::SeqCst) {
                    match rebuild(source, resolver, options).await {
                        Ok(index) => {
                            let posts = index.len();
                            let version = self.install(index);
                            tracing::info!(channel = %self.channel, version, posts, "index swapped");
                            last = Some(Ok(version));
                        }
                        Err(err) => {
                            tracing::warn!(
                                channel = %self.channel,
                                error = %err,
                                "rebuild failed, keeping previous index"
                            );
                            last = Some(Err(err));
                        }
                    }
                }
            }
            // A request may have landed between the last swap and the unlock.
            if !self.pending.load(Ordering::SeqCst) {
                break;
            }
        }

        match last {
            Some(Ok(version)) => Ok(RebuildOutcome::Rebuilt(version)),
            Some(Err(err)) => Err(err),
            None => Ok(RebuildOutcome::Queued),
        }
    }
}

impl std::fmt::Debug for IndexSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexSlot")
            .field("channel", &self.channel)
            .field("version", &self.version())
            .finish()
    }
}

/// Error for a rebuild that did not finish in time.
pub fn timed_out(channel: &str, after_secs: u64) -> Error {
    Error::History {
        channel: channel.to_string(),
        reason: format!("rebuild timed out after {after_secs}s"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::document::tests::{FlakyHistory, doc};
    use crate::document::{Document, VecHistory};
    use crate::resolve::tests::sample_resolver;

    /// History whose first walk blocks until the gate is opened.
    struct GatedHistory {
        inner: VecHistory,
        gate: Notify,
        walks: AtomicUsize,
    }

    #[async_trait]
    impl HistorySource for GatedHistory {
        fn channel(&self) -> &str {
            self.inner.channel()
        }

        async fn fetch_history_page(
            &self,
            before: Option<&str>,
            limit: usize,
        ) -> Result<Vec<Document>> {
            if before.is_none() {
                let walk = self.walks.fetch_add(1, Ordering::SeqCst);
                if walk == 0 {
                    self.gate.notified().await;
                }
            }
            self.inner.fetch_history_page(before, limit).await
        }
    }

    #[tokio::test]
    async fn starts_empty() {
        let slot = IndexSlot::new("news");
        assert_eq!(slot.version(), 0);
        assert!(slot.current().is_empty());
        assert!(!slot.is_rebuilding());
    }

    #[tokio::test]
    async fn rebuild_bumps_version() {
        let slot = IndexSlot::new("news");
        let history = VecHistory::new("news", vec![doc("1", 1, "a"), doc("2", 2, "b")]);
        let resolver = sample_resolver();
        let options = IndexOptions::default();

        let outcome = slot.request_rebuild(&history, &resolver, &options).await.unwrap();
        assert_eq!(outcome, RebuildOutcome::Rebuilt(1));
        assert_eq!(slot.current().len(), 2);

        let outcome = slot.request_rebuild(&history, &resolver, &options).await.unwrap();
        assert_eq!(outcome, RebuildOutcome::Rebuilt(2));
    }

    #[tokio::test]
    async fn failure_keeps_previous_index() {
        let slot = IndexSlot::new("news");
        let resolver = sample_resolver();
        let options = IndexOptions::default();
        let good = VecHistory::new("news", vec![doc("1", 1, "a")]);
        slot.request_rebuild(&good, &resolver, &options).await.unwrap();
        let before = slot.current();

        let flaky = FlakyHistory {
            inner: VecHistory::new("news", vec![doc("9", 9, "z")]),
            fail_on: 0,
            calls: AtomicUsize::new(0),
        };
        let err = slot
            .request_rebuild(&flaky, &resolver, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::History { .. }));

        let after = slot.current();
        assert!(Arc::ptr_eq(&before, &after));
        assert_eq!(after.version(), 1);
        assert!(after.post("1").is_some());
    }

    #[tokio::test]
    async fn concurrent_requests_coalesce() {
        let slot = Arc::new(IndexSlot::new("news"));
        let source = Arc::new(GatedHistory {
            inner: VecHistory::new("news", vec![doc("1", 1, "a")]),
            gate: Notify::new(),
            walks: AtomicUsize::new(0),
        });
        let resolver = Arc::new(sample_resolver());

        let first = tokio::spawn({
            let slot = Arc::clone(&slot);
            let source = Arc::clone(&source);
            let resolver = Arc::clone(&resolver);
            async move {
                slot.request_rebuild(&*source, &*resolver, &IndexOptions::default())
                    .await
            }
        });

        while source.walks.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(slot.is_rebuilding());

        let second = slot
            .request_rebuild(&*source, &*resolver, &IndexOptions::default())
            .await
            .unwrap();
        assert_eq!(second, RebuildOutcome::Queued);

        source.gate.notify_one();
        let first = first.await.unwrap().unwrap();

        // the queued request was served by the running rebuild
        assert_eq!(first, RebuildOutcome::Rebuilt(2));
        assert_eq!(source.walks.load(Ordering::SeqCst), 2);
        assert_eq!(slot.version(), 2);
    }

    #[test]
    fn timeout_error_names_channel() {
        let err = timed_out("news", 120);
        assert!(err.to_string().contains("news"));
        assert!(err.to_string().contains("120s"));
    }
}
