//! Error types for the rendering core.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by index rebuilds.
///
/// Rendering itself never fails: resolver problems and unknown node kinds
/// are recovered locally. Only fetching the upstream history can abort a
/// rebuild.
#[derive(Error, Debug)]
pub enum Error {
    /// The upstream history could not be fetched.
    #[error("history fetch failed for channel {channel}: {reason}")]
    History {
        /// Channel whose history was being paged.
        channel: String,
        /// Description of the upstream failure.
        reason: String,
    },
}

/// Failure of a single entity lookup.
///
/// Always degraded to a literal fallback by the renderers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("lookup of {kind} {id} failed: {reason}")]
pub struct ResolveError {
    /// Kind of entity (`channel`, `role`, `user`, `emoji`).
    pub kind: &'static str,
    /// The opaque reference id.
    pub id: String,
    /// Description of the failure.
    pub reason: String,
}

impl ResolveError {
    /// Build a lookup error for the given entity kind and id.
    pub fn new(kind: &'static str, id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            reason: reason.into(),
        }
    }
}
