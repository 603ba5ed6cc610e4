use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;
use tsdbpush_core::store::InsertSink;
use tsdbpush_ingest::sink::MemoryStore;
use tsdbpush_ingest::{create_router, AppState, IngestConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Arc::new(IngestConfig::load()?);
    info!("Loaded configuration: {:?}", config);

    // Wire the in-process store behind the insertion interface
    let store = MemoryStore::new();
    let sink_store = Arc::clone(&store);
    let state = AppState::new(
        config.clone(),
        Arc::new(move || Box::new(sink_store.sink()) as Box<dyn InsertSink>),
    )?;

    let app = create_router(state);

    // Start server
    let listener = TcpListener::bind(&config.bind_address).await?;
    let addr = listener.local_addr()?;
    info!("tsdbpush ingest service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
