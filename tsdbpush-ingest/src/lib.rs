//! tsdbpush Ingestion Service Library
//!
//! The write-path front end of a time-series database: OpenTSDB JSON and
//! telnet wire-format parsers, a pooled request-processing pipeline, and
//! the HTTP handlers that tie them to a downstream insertion sink.

// Core modules
pub mod config;
pub mod handlers;
pub mod insert;
pub mod json_parser;
pub mod limiter;
pub mod metrics;
pub mod pipeline;
pub mod sink;
pub mod telnet_parser;

use std::sync::Arc;

use crate::limiter::ConcurrencyLimiter;
use crate::metrics::IngestMetrics;
use crate::pipeline::{Format, PushCtxPool, SinkFactory};

// Re-export commonly used types
pub use config::IngestConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<IngestConfig>,
    pub limiter: ConcurrencyLimiter,
    pub json_pool: Arc<PushCtxPool>,
    pub telnet_pool: Arc<PushCtxPool>,
    pub metrics: Arc<IngestMetrics>,
    pub registry: Arc<prometheus::Registry>,
}

impl AppState {
    /// Build the shared state: admission limiter, per-format context
    /// pools, and the injected metrics registry.
    pub fn new(config: Arc<IngestConfig>, sink_factory: SinkFactory) -> anyhow::Result<Self> {
        let registry = Arc::new(prometheus::Registry::new());
        let metrics = Arc::new(IngestMetrics::new(&registry)?);
        let limiter = ConcurrencyLimiter::new(
            config.performance.max_concurrent_inserts,
            config.request_timeout(),
        );

        Ok(Self {
            config,
            limiter,
            json_pool: PushCtxPool::new(Format::Json, Arc::clone(&sink_factory)),
            telnet_pool: PushCtxPool::new(Format::Telnet, sink_factory),
            metrics,
            registry,
        })
    }
}

/// Create the main application router
pub fn create_router(state: AppState) -> axum::Router {
    use crate::handlers::*;
    use axum::extract::DefaultBodyLimit;
    use axum::routing::{get, post};
    use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

    // The configured request-size cap replaces axum's built-in body limit;
    // gzip bodies are additionally bounded after decompression in the
    // pipeline.
    let max_request_size = state.config.ingestion.max_request_size as usize;

    axum::Router::new()
        // Health and monitoring endpoints
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        // Data ingestion endpoints (OpenTSDB compatible)
        .route("/api/put", post(put_json_handler))
        .route("/api/put/telnet", post(put_telnet_handler))
        .layer(RequestBodyLimitLayer::new(max_request_size))
        .layer(DefaultBodyLimit::disable())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
