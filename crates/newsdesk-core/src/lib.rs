//! Rendering core for the newsdesk site.
//!
//! Turns chat messages, each carrying an externally parsed markdown tree,
//! into a browsable news index.
//!
//! This crate provides:
//! - The document tree ([`Node`]) and its JSON wire form
//! - HTML and plaintext renderers that resolve channel, role, user and emoji
//!   references through an async [`EntityResolver`]
//! - Post-processing passes: heading promotion, whitespace minification and
//!   entity escaping
//! - The per-channel [`DocumentIndex`] with search and pagination
//! - [`IndexSlot`], a versioned holder with single-flight rebuilds
//! - Output fragments for listing pages, post pages, RSS and sitemaps
//!
//! # Escaping
//!
//! Text leaves are escaped exactly once, when they are rendered. Renderer
//! output is never escaped again; values that bypass the renderer (author
//! names, query echoes, plaintext titles) go through
//! [`postprocess::escape_html`] or maud.

pub mod ast;
pub mod document;
mod error;
pub mod index;
pub mod output;
pub mod postprocess;
pub mod render;
pub mod resolve;
pub mod slot;

pub use ast::{Content, Node};
pub use document::{
    Attachment, Author, Document, HISTORY_PAGE_LIMIT, HistorySource, TOMBSTONES, VecHistory,
    fetch_all_history,
};
pub use error::{Error, ResolveError, Result};
pub use index::{DocumentIndex, IndexOptions, PAGE_SIZE, RenderedPost, paginate, rebuild, search};
pub use render::{SEPARATOR, render_body, render_plain};
pub use resolve::{EntityResolver, MapResolver};
pub use slot::{IndexSlot, RebuildOutcome};
