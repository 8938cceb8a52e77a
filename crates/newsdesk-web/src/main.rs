//! Newsdesk - HTTP server for the mirrored news site.
//!
//! Loads channel exports, builds one index per feed and serves them as
//! HTML, RSS and sitemaps.

use std::sync::Arc;
use std::time::Duration;

use axum::http::Request;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use newsdesk_web::export::load_entities;
use newsdesk_web::{AppState, Config, router};

/// Newsdesk - news site mirrored from chat channels.
#[derive(Parser, Debug)]
#[command(name = "newsdesk")]
#[command(about = "News site server for mirrored chat channels", long_about = None)]
struct Args {
    /// Path to .env file (optional).
    #[arg(long, env = "DOTENV_PATH", default_value = ".env")]
    dotenv: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Load .env file if it exists
    if std::path::Path::new(&args.dotenv).exists() {
        dotenvy::from_path(&args.dotenv)?;
        eprintln!("Loaded environment from {}", args.dotenv);
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let refresh_secs = config.refresh_secs;

    // Entity names and application state
    let resolver = load_entities(&config.export_dir).await?;
    let state = AppState::new(config, Arc::new(resolver));

    // Initial build; failures leave the feed empty until the next refresh
    state.refresh_all().await;

    if refresh_secs > 0 {
        let state = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(refresh_secs));
            // The first tick completes immediately and the index is fresh.
            interval.tick().await;
            loop {
                interval.tick().await;
                tracing::debug!("periodic refresh");
                state.refresh_all().await;
            }
        });
        tracing::info!(refresh_secs, "periodic refresh enabled");
    }

    // Build router with middleware
    let app = router(state)
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::span!(
                    Level::INFO,
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }),
        )
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "starting newsdesk server");

    axum::serve(listener, app).await?;

    Ok(())
}
