//! Newsdesk - a news site mirrored from chat channels.
//!
//! This crate serves the indexes built by `newsdesk-core` as HTML pages,
//! RSS feeds and sitemaps. It is designed to be placed behind a CDN.
//!
//! # Architecture
//!
//! - **Export**: Each feed reads `<export_dir>/<feed>.json`; entity names
//!   come from `entities.json`
//! - **Index**: One [`newsdesk_core::IndexSlot`] per feed, rebuilt at
//!   startup, on a timer and on `POST /notify/{feed}`
//! - **Render**: Page chrome with Open Graph tags using maud
//! - **Cache**: In-process moka cache keyed by index version, plus
//!   Cache-Control headers and ETags for the CDN
//!
//! # URL Pattern
//!
//! ```text
//! GET /                     default feed
//! GET /f/{feed}/...         any configured feed
//! ```
//!
//! # Security
//!
//! - Post bodies are escaped once by the core renderer; everything else is
//!   escaped by maud
//! - Links and images are restricted to HTTP(S) URLs
//! - Content-Security-Policy only allows the bundled timestamp script
//! - X-Frame-Options: DENY prevents clickjacking

pub mod auth;
pub mod config;
pub mod error;
pub mod export;
pub mod render;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
