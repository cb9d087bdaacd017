//! HTTP endpoint receiving uploaded investigation bundles.
//!
//! This module provides an HTTP server that:
//! - Accepts bundles via POST /upload and keeps them in memory
//! - Lists everything received via GET /data
//!
//! # Architecture
//!
//! ```text
//! agent upload ──→ POST /upload ──→ [in-memory store] ──→ GET /data
//! ```

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Bind on all interfaces instead of loopback only
    pub public: bool,
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new(port: u16) -> Self {
        Self {
            port,
            public: true,
        }
    }

    /// Bind on 127.0.0.1 only.
    pub fn loopback(port: u16) -> Self {
        Self {
            port,
            public: false,
        }
    }

    fn bind_addr(&self) -> SocketAddr {
        if self.public {
            SocketAddr::from(([0, 0, 0, 0], self.port))
        } else {
            SocketAddr::from(([127, 0, 0, 1], self.port))
        }
    }
}

/// Shared server state
#[derive(Default)]
pub struct ServerState {
    /// Every bundle received, in arrival order
    received: RwLock<Vec<serde_json::Value>>,
}

/// Response from the upload endpoint
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub total: usize,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Whether a parsed body is falsy: null, false, zero, or an empty string, array or object.
fn is_empty_document(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Bool(flag) => !flag,
        serde_json::Value::Number(n) => n.as_f64() == Some(0.0),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
    }
}

/// POST /upload
///
/// Stores the JSON body and reports how many bundles are held.
async fn upload(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> Result<Json<UploadResponse>, (StatusCode, Json<ErrorResponse>)> {
    let no_json = |error: String| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error,
                code: "NO_JSON".to_string(),
            }),
        )
    };

    let content: serde_json::Value = serde_json::from_slice(&body)
        .map_err(|e| no_json(format!("No JSON data received: {e}")))?;
    if is_empty_document(&content) {
        return Err(no_json("No JSON data received".to_string()));
    }

    let total = {
        let mut received = state.received.write().await;
        received.push(content);
        received.len()
    };
    tracing::info!(total, bytes = body.len(), "Bundle received");

    Ok(Json(UploadResponse {
        message: "Data received and stored".to_string(),
        total,
    }))
}

/// GET /data
async fn data(State(state): State<Arc<ServerState>>) -> Json<Vec<serde_json::Value>> {
    Json(state.received.read().await.clone())
}

/// Build the router over the given state.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/data", get(data))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let state = Arc::new(ServerState::default());
    let app = router(state);

    let listener = TcpListener::bind(config.bind_addr()).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Receiving endpoint listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_documents() {
        assert!(is_empty_document(&json!(null)));
        assert!(is_empty_document(&json!({})));
        assert!(is_empty_document(&json!([])));
        assert!(!is_empty_document(&json!({"battery": "73%"})));
        assert!(is_empty_document(&json!(0)));
        assert!(is_empty_document(&json!(0.0)));
        assert!(is_empty_document(&json!(false)));
        assert!(is_empty_document(&json!("")));
        assert!(!is_empty_document(&json!(1)));
        assert!(!is_empty_document(&json!(true)));
        assert!(!is_empty_document(&json!("x")));
    }

    #[test]
    fn test_bind_addr() {
        assert_eq!(ServerConfig::new(5001).bind_addr().to_string(), "0.0.0.0:5001");
        assert_eq!(ServerConfig::loopback(0).bind_addr().to_string(), "127.0.0.1:0");
    }
}
