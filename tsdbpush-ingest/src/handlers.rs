//! HTTP handlers for the OpenTSDB-compatible write API.
//!
//! Both put endpoints share the same contract: 204 No Content with an
//! empty body on success, an error status with a plaintext diagnostic on
//! failure. Bodies may be gzip-compressed (`Content-Encoding: gzip`).

use std::io::Cursor;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use flate2::read::MultiGzDecoder;
use prometheus::TextEncoder;
use serde_json::json;
use tracing::{debug, error, warn};
use tsdbpush_core::error::IngestError;

use crate::pipeline::{process_request, PushCtxPool};
use crate::AppState;

/// Liveness endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "tsdbpush-ingest",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Prometheus text exposition of the injected registry.
pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let encoder = TextEncoder::new();
    match encoder.encode_to_string(&state.registry.gather()) {
        Ok(body) => {
            let mut headers = HeaderMap::new();
            headers.insert(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
            );
            (StatusCode::OK, headers, body)
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                HeaderMap::new(),
                format!("Failed to encode metrics: {}", e),
            )
        }
    }
}

/// OpenTSDB HTTP put endpoint (JSON object or array body).
pub async fn put_json_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let pool = Arc::clone(&state.json_pool);
    handle_put(state, pool, headers, body).await
}

/// OpenTSDB telnet put endpoint (line-delimited body over HTTP).
pub async fn put_telnet_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let pool = Arc::clone(&state.telnet_pool);
    handle_put(state, pool, headers, body).await
}

async fn handle_put(
    state: AppState,
    pool: Arc<PushCtxPool>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    // Admission control: block until a parse/insert slot frees. Dropping
    // this future on client disconnect abandons the wait without holding
    // anything.
    let _permit = match state.limiter.acquire().await {
        Ok(permit) => permit,
        Err(e) => {
            warn!("admission rejected request: {}", e);
            return error_response(&e);
        }
    };

    let format = pool.format();
    let metrics = state.metrics.for_format(format);
    let max_size = state.config.ingestion.max_request_size;
    let gzip = headers
        .get(header::CONTENT_ENCODING)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.contains("gzip"))
        .unwrap_or(false);

    let mut ctx = pool.acquire();
    let result = {
        let cursor = Cursor::new(&body[..]);
        if gzip {
            let mut reader = MultiGzDecoder::new(cursor);
            process_request(&mut ctx, &mut reader, max_size, metrics)
        } else {
            let mut reader = cursor;
            process_request(&mut ctx, &mut reader, max_size, metrics)
        }
    };
    drop(ctx);

    match result {
        Ok(()) => {
            debug!(format = format.name(), "insert request processed");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => {
            warn!(format = format.name(), "insert request failed: {}", e);
            error_response(&e)
        }
    }
}

/// Map an error to a status code plus a plaintext diagnostic body.
fn error_response(err: &IngestError) -> Response {
    let status = match err {
        IngestError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        IngestError::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
        IngestError::Read(_)
        | IngestError::Parse(_)
        | IngestError::Validation(_)
        | IngestError::Json(_) => StatusCode::BAD_REQUEST,
        IngestError::Storage(_) | IngestError::Configuration(_) | IngestError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string()).into_response()
}
