use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use snippet_api_rust::cli::{Cli, Commands};
use snippet_api_rust::config::{AppConfig, StorageBackend};
use snippet_api_rust::database::{DatabaseManager, MemoryStore, PgStore, Storage};
use snippet_api_rust::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env().context("invalid configuration")?;
    info!("Starting Snippet API in {:?} mode", config.environment);

    match cli.command() {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.api.port = port;
            }
            serve(config).await
        }
        Commands::InitDb => {
            let store = open_store(&config).await?;
            store.init_schema().await.context("schema creation failed")?;
            info!("Database schema is ready");
            Ok(())
        }
    }
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Arc<dyn Storage>> {
    match config.database.backend {
        StorageBackend::Postgres => {
            let pool = DatabaseManager::connect(&config.database)
                .await
                .context("failed to connect to PostgreSQL")?;
            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; all data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let store = open_store(&config).await?;
    store.init_schema().await.context("schema creation failed")?;

    let bind_addr = config.bind_addr();
    let state = AppState::new(store, config).context("invalid signing keys")?;
    info!("Signing tokens with key '{}'", state.keys.active_kid());

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("Snippet API listening on http://{}", bind_addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
