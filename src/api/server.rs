//! Summary API server lifecycle and handlers.
//!
//! Serves `GET /api/incidents.json` (aggregate of the local export, cached
//! via `Cache-Control` and a SHA-256 `ETag`, `304` on a matching
//! `If-None-Match`) and `GET /healthz`. CORS is exact-origin with
//! credentials, enabled only when an origin is configured.
//!
//! Pattern: bind → spawn background task → return handle with shutdown
//! channel; `serve_on` exists so tests can bind `127.0.0.1:0`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;

use crate::api::summary::aggregate;
use crate::config::ApiConfig;
use crate::export;

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind api server: {0}")]
    Bind(std::io::Error),

    #[error("api server failed: {0}")]
    Serve(std::io::Error),

    #[error("invalid CORS origin: {0}")]
    InvalidOrigin(String),
}

/// Handle to a running summary API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Shut down the server gracefully. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }
}

/// Build the router for a given configuration.
pub fn router(config: Arc<ApiConfig>) -> Result<Router, ServeError> {
    let cors = match &config.cors_origin {
        Some(origin) => {
            let origin: HeaderValue = origin
                .parse()
                .map_err(|_| ServeError::InvalidOrigin(origin.clone()))?;
            Some(
                CorsLayer::new()
                    .allow_origin(origin)
                    .allow_methods([Method::GET])
                    .allow_credentials(true),
            )
        }
        None => None,
    };

    let mut router = Router::new()
        .route("/api/incidents.json", get(incidents))
        .route("/healthz", get(healthz))
        .with_state(config);
    if let Some(cors) = cors {
        router = router.layer(cors);
    }
    Ok(router)
}

/// Run the server on the configured port until the process exits.
pub async fn serve(config: ApiConfig) -> Result<(), ServeError> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(ServeError::Bind)?;
    let addr = listener.local_addr().map_err(ServeError::Bind)?;
    tracing::info!(%addr, "API server started");

    let app = router(Arc::new(config))?;
    axum::serve(listener, app).await.map_err(ServeError::Serve)
}

/// Start the server on an explicit address in a background task.
pub async fn serve_on(config: ApiConfig, addr: SocketAddr) -> Result<ApiServer, ServeError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(ServeError::Bind)?;
    let addr = listener.local_addr().map_err(ServeError::Bind)?;

    let app = router(Arc::new(config))?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
        };
        tracing::info!(%addr, "API server started");
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }
        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}

// ═══════════════════════════════════════════════════════════
// Handlers
// ═══════════════════════════════════════════════════════════

async fn healthz() -> &'static str {
    "ok"
}

async fn incidents(State(config): State<Arc<ApiConfig>>, headers: HeaderMap) -> Response {
    let csv_path = config.csv_path.clone();
    let records = tokio::task::spawn_blocking(move || export::read_csv(&csv_path)).await;

    let records = match records {
        Ok(Ok(records)) => records,
        Ok(Err(e)) => {
            tracing::warn!(path = %config.csv_path.display(), error = %e, "Export unreadable");
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "EXPORT_UNAVAILABLE",
                "incident export is not available yet",
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Export read task failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "an internal error occurred",
            );
        }
    };

    let payload = aggregate(&records, chrono::Utc::now().date_naive());
    let body = match serde_json::to_vec(&payload) {
        Ok(body) => body,
        Err(e) => {
            tracing::error!(error = %e, "Summary serialization failed");
            return error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "an internal error occurred",
            );
        }
    };

    let etag = format!("\"{}\"", hex_digest(&body));
    if headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == etag)
    {
        return (StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response();
    }

    (
        [
            (
                header::CONTENT_TYPE,
                "application/json; charset=utf-8".to_string(),
            ),
            (
                header::CACHE_CONTROL,
                format!("public, max-age={}", config.cache_max_age),
            ),
            (header::ETAG, etag),
        ],
        body,
    )
        .into_response()
}

fn hex_digest(body: &[u8]) -> String {
    Sha256::digest(body)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn error_response(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(serde_json::json!({
            "error": { "code": code, "message": message }
        })),
    )
        .into_response()
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
