//! Brand Wallet Server
//!
//! Deposit flow and pending-deposit reconciliation for brand wallets.

mod api;
mod brands;
mod config;
mod server;
mod shutdown;
mod state;

use bwallet_core::processors::{FeedRoutes, StatusFeed};
use clap::Parser;
use config::{ConfigLoader, get_database_url};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Brand Wallet - deposit flow and reconciliation server
#[derive(Parser, Debug)]
#[command(name = "bwallet-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "BWALLET_CONFIG", default_value = "./bwallet-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting bwallet-server v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(&args.config, args.listen));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // One listener connection serves every brand, outside the query pool
    let routes = FeedRoutes::new();
    let (feed_shutdown_tx, feed_shutdown_rx) = watch::channel(false);
    let feed = StatusFeed::connect(&database_url, routes.clone(), feed_shutdown_rx)
        .await
        .map_err(|e| {
            tracing::error!("Failed to subscribe to the status feed: {}", e);
            e
        })?;
    let feed_handle = tokio::spawn(feed.run());

    let state = AppState::new(db_pool.clone(), routes, &loaded_config);
    let sweeper_handle = state.brands.spawn_sweeper();

    // SIGHUP reloads wire and checkout sections
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    let router = build_router(state.clone());

    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    shutdown_notify.notify_one();

    tracing::info!("Stopping wallet watches...");
    state.brands.shutdown_all().await;
    let _ = feed_shutdown_tx.send(true);
    for (name, handle) in [("status feed", feed_handle), ("brand sweeper", sweeper_handle)] {
        if let Err(e) = handle.await {
            tracing::error!("{} task panicked: {}", name, e);
        }
    }

    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
