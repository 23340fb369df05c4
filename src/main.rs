//! Sentinel Core - insider-threat detection service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --release
//!
//! # Run against an ephemeral in-memory store (useful for local testing)
//! cargo run --release -- --ephemeral
//! ```
//!
//! # Environment Variables
//!
//! See `config::defaults` and `config::Settings::from_env` for the full list
//! (token lifetimes, risk weights, queue capacity, JWT secret, store path).

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use sentinel_core::api::{create_app, AppState};
use sentinel_core::broadcast::Broadcaster;
use sentinel_core::config::{self, Settings};
use sentinel_core::pipeline::QueuedAccess;
use sentinel_core::queue;
use sentinel_core::store::{MemoryStore, SledStore, Store};
use sentinel_core::worker::Worker;

#[derive(Parser, Debug)]
#[command(name = "sentinel-core")]
#[command(about = "Insider-threat detection core: ingest, score, alert")]
#[command(version)]
struct CliArgs {
    /// Override the server bind address (default "0.0.0.0:8080").
    #[arg(short, long)]
    addr: Option<String>,

    /// Use an in-memory store instead of the on-disk sled database. Useful
    /// for local testing; all state is lost on exit.
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    config::init(Settings::from_env());
    let settings = config::get();

    let server_addr = args.addr.unwrap_or_else(|| "0.0.0.0:8080".to_string());

    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("  Sentinel Core — insider-threat detection service");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let store: Arc<dyn Store> = if args.ephemeral {
        info!("using in-memory store (--ephemeral): no state survives restart");
        Arc::new(MemoryStore::default())
    } else {
        info!(path = %settings.store_path, "opening sled store");
        Arc::new(SledStore::open(&settings.store_path).context("failed to open sled store")?)
    };

    let (queue_tx, queue_rx) = queue::bounded::<QueuedAccess>(settings.queue_capacity, settings.queue_near_capacity_ratio);
    let broadcaster = Broadcaster::new();

    let worker = Arc::new(Worker::new(Arc::clone(&store), broadcaster.clone()));
    let cancel_token = CancellationToken::new();

    let app_state = AppState {
        queue: queue_tx,
        store,
        broadcaster,
    };
    let app = create_app(app_state);

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("failed to bind to {server_addr}"))?;
    info!(addr = %server_addr, "http server listening");

    let mut tasks = JoinSet::new();

    let worker_cancel = cancel_token.clone();
    let worker_handle = Arc::clone(&worker);
    tasks.spawn(async move {
        info!("[Worker] task starting");
        worker_handle.run(queue_rx, worker_cancel).await;
        info!("[Worker] task exited");
    });

    let http_cancel = cancel_token.clone();
    tasks.spawn(async move {
        info!("[HttpServer] task starting");
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                http_cancel.cancelled().await;
                info!("[HttpServer] received shutdown signal");
            })
            .await
        {
            error!(error = %e, "[HttpServer] server error");
        }
        info!("[HttpServer] task exited");
    });

    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("received ctrl-c, initiating shutdown");
        shutdown_token.cancel();
    });

    cancel_token.cancelled().await;
    tokio::time::timeout(config::get().shutdown_drain_timeout, async {
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "task ended with a join error during shutdown");
            }
        }
    })
    .await
    .ok();

    info!("sentinel-core shutdown complete");
    Ok(())
}
