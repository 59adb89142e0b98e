use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use adlens::api;
use adlens::config::{Config, StoreBackend};
use adlens::storage::{BenchmarkStore, MemoryBenchmarkStore, SqliteBenchmarkStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize benchmark store
    let store: Arc<dyn BenchmarkStore> = match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory benchmark store (thresholds won't survive restarts)");
            Arc::new(MemoryBenchmarkStore::new())
        }
        StoreBackend::Sqlite => {
            info!("Using SQLite benchmark store: {}", config.store.url);
            Arc::new(
                SqliteBenchmarkStore::new(&config.store.url, config.store.max_connections).await?,
            )
        }
    };

    info!("Initializing benchmark store...");
    store.init().await?;
    info!("Benchmark store initialized successfully");

    // Create router
    let router = api::create_api_router(Arc::clone(&store), config.limits.max_rows);

    // Start API server
    let api_addr = format!("{}:{}", config.api_server.host, config.api_server.port);
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("🚀 API server listening on http://{}", api_addr);
    info!("   - POST http://{}/api/aggregate", api_addr);
    info!("   - GET/PUT http://{}/api/benchmarks/{{account}}", api_addr);

    axum::serve(listener, router).await?;

    Ok(())
}
