//! Nursery Feed - public product feed and storefront sync
//!
//! Serves the storefront endpoints over HTTP until interrupted.

use clap::Parser;
use nursery_feed::config::{Args, StoreBackend};
use nursery_feed::{AppState, InventoryStore, RateLimiter, SqliteStore, SupabaseStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    log::info!("Starting nursery_feed...");

    let (cors, limiter, sweep_every) =
        match (args.cors_policy(), args.rate_limiter(), args.sweep_interval()) {
            (Ok(cors), Ok(limiter), Ok(sweep_every)) => (cors, limiter, sweep_every),
            (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
                log::error!("Invalid configuration: {}", e);
                std::process::exit(1);
            }
        };

    let store = match open_store(&args) {
        Some(store) => store,
        None => std::process::exit(1),
    };

    log::info!(
        "CORS: {}; rate limit: {} requests per {}s",
        if cors.is_production() {
            "production origins"
        } else {
            "any origin"
        },
        limiter.limit(),
        limiter.window().as_secs()
    );

    let state = AppState::new(store, limiter, cors);

    // Drop expired rate-limit records so the map only holds active clients
    let sweeper = Arc::clone(&state.limiter);
    tokio::spawn(async move {
        run_sweeper(&sweeper, sweep_every).await;
    });

    if let Err(e) = nursery_feed::web::serve(state, args.port, shutdown_signal()).await {
        log::error!("Web server error: {}", e);
        std::process::exit(1);
    }

    log::info!("Shut down cleanly.");
}

/// Build the configured inventory store, logging why it failed if it did
fn open_store(args: &Args) -> Option<Arc<dyn InventoryStore>> {
    let backend = match args.store_backend() {
        Ok(backend) => backend,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            return None;
        }
    };

    match backend {
        StoreBackend::Supabase { url, key, table } => {
            log::info!("Reading inventory from {} (table {})", url, table);
            Some(Arc::new(SupabaseStore::new(&url, &key, &table)))
        }
        StoreBackend::Sqlite { path, import } => {
            log::info!("Database path: {}", path.display());
            let store = match SqliteStore::open(&path) {
                Ok(store) => store,
                Err(e) => {
                    log::error!("Failed to open database: {}", e);
                    return None;
                }
            };

            if let Some(import) = import {
                match store.import_json_file(&import) {
                    Ok(count) => log::info!("Imported {} rows from {}", count, import.display()),
                    Err(e) => {
                        log::error!("Failed to import {}: {}", import.display(), e);
                        return None;
                    }
                }
            }
            Some(Arc::new(store))
        }
    }
}

/// Periodically drop expired rate-limit records
async fn run_sweeper(limiter: &RateLimiter, every: Duration) {
    let mut ticker = interval(every);
    // First tick fires immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        let removed = limiter.sweep_expired();
        if removed > 0 {
            log::debug!(
                "Dropped {} expired rate-limit records ({} active)",
                removed,
                limiter.tracked_clients()
            );
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
