//! Webhook receiver used to exercise the generator locally
//!
//! `POST /webhook` accepts any JSON body, logs it and answers
//! `{"status": "success"}`. `GET /health` answers `ok`.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Receiver result type
pub type Result<T> = std::result::Result<T, ReceiverError>;

/// Errors that stop the receiver
#[derive(Error, Debug)]
pub enum ReceiverError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shared receiver counters
#[derive(Debug, Default)]
pub struct ReceiverState {
    /// Requests seen, including rejected ones
    seen: AtomicU64,

    /// Events acknowledged
    received: AtomicU64,

    /// Reject this many requests before acknowledging
    fail_first: u64,
}

impl ReceiverState {
    /// Create state that rejects the first `fail_first` requests
    pub fn new(fail_first: u64) -> Self {
        Self {
            fail_first,
            ..Default::default()
        }
    }

    /// Number of acknowledged events
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::SeqCst)
    }
}

async fn receive_webhook(
    State(state): State<Arc<ReceiverState>>,
    Json(payload): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let index = state.seen.fetch_add(1, Ordering::SeqCst);
    if index < state.fail_first {
        warn!(request = index + 1, "Rejecting webhook (fail-first mode)");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "unavailable" })),
        );
    }

    let count = state.received.fetch_add(1, Ordering::SeqCst) + 1;
    info!(count, "Received webhook payload: {}", payload);

    (StatusCode::OK, Json(json!({ "status": "success" })))
}

async fn health() -> &'static str {
    "ok"
}

/// Build the receiver router
pub fn router(state: Arc<ReceiverState>) -> Router {
    Router::new()
        .route("/webhook", post(receive_webhook))
        .route("/health", get(health))
        .with_state(state)
}

/// Listen on `addr` until `shutdown` resolves
pub async fn serve<F>(addr: &str, state: Arc<ReceiverState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ReceiverError::Bind {
            addr: addr.to_string(),
            source,
        })?;

    info!("📥 Receiver listening on http://{}/webhook", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
