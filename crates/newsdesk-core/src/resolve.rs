//! Entity resolution for channel, role, user and emoji references.
//!
//! Renderers consume the resolver as an opaque async capability. A lookup
//! either succeeds, reports "not found" (`Ok(None)`) or fails (`Err`); the
//! renderers treat the last two the same way and fall back to a literal
//! rendering of the raw id.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use crate::ast::Reference;
use crate::error::ResolveError;

/// Async lookup of display values for opaque reference ids.
#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// Channel name (without the leading `#`).
    async fn channel(&self, id: &str) -> Result<Option<String>, ResolveError>;

    /// Role name (without the leading `@`).
    async fn role(&self, id: &str) -> Result<Option<String>, ResolveError>;

    /// User display name, falling back to the username upstream.
    async fn user(&self, id: &str) -> Result<Option<String>, ResolveError>;

    /// Image URL of a custom emoji.
    async fn emoji(&self, id: &str) -> Result<Option<String>, ResolveError>;
}

/// Resolver backed by in-memory id → value maps.
///
/// Used by the file-backed export and in tests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MapResolver {
    #[serde(default)]
    pub channels: HashMap<String, String>,
    #[serde(default)]
    pub roles: HashMap<String, String>,
    #[serde(default)]
    pub users: HashMap<String, String>,
    #[serde(default)]
    pub emojis: HashMap<String, String>,
}

#[async_trait]
impl EntityResolver for MapResolver {
    async fn channel(&self, id: &str) -> Result<Option<String>, ResolveError> {
        Ok(self.channels.get(id).cloned())
    }

    async fn role(&self, id: &str) -> Result<Option<String>, ResolveError> {
        Ok(self.roles.get(id).cloned())
    }

    async fn user(&self, id: &str) -> Result<Option<String>, ResolveError> {
        Ok(self.users.get(id).cloned())
    }

    async fn emoji(&self, id: &str) -> Result<Option<String>, ResolveError> {
        Ok(self.emojis.get(id).cloned())
    }
}

/// Look up a channel/role/user reference, collapsing misses and failures.
pub(crate) async fn lookup_reference<R: EntityResolver + ?Sized>(
    resolver: &R,
    reference: Reference,
    id: &str,
) -> Option<String> {
    let (kind, result) = match reference {
        Reference::Channel => ("channel", resolver.channel(id).await),
        Reference::Role => ("role", resolver.role(id).await),
        Reference::User => ("user", resolver.user(id).await),
    };
    settle(kind, id, result)
}

/// Look up a custom emoji image, collapsing misses and failures.
pub(crate) async fn lookup_emoji<R: EntityResolver + ?Sized>(
    resolver: &R,
    id: &str,
) -> Option<String> {
    settle("emoji", id, resolver.emoji(id).await)
}

fn settle(
    kind: &'static str,
    id: &str,
    result: Result<Option<String>, ResolveError>,
) -> Option<String> {
    match result {
        Ok(Some(value)) => Some(value),
        Ok(None) => {
            tracing::debug!(kind, id, "reference not found, using fallback");
            None
        }
        Err(err) => {
            tracing::warn!(kind, id, error = %err, "reference lookup failed, using fallback");
            None
        }
    }
}
