//! HTTP transport: the MCP server over rmcp's StreamableHttpService plus a
//! small REST surface for web clients.
//!
//! Usage: `guata serve --http 0.0.0.0:8080`
//!
//! - `/mcp` streamable HTTP MCP endpoint
//! - `POST /api/ask` with an [`AskRequest`] body
//! - `GET /api/search?q=...&limit=...`
//! - `GET /health`

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use thiserror::Error;

use crate::config::schema::GuataConfig;
use crate::types::AskRequest;

use super::server::GuataServer;

// ---------------------------------------------------------------------------
// REST errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} must not be empty")]
    EmptyField(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::EmptyField(_) => StatusCode::BAD_REQUEST,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// REST handlers
// ---------------------------------------------------------------------------

async fn ask_handler(
    State(server): State<GuataServer>,
    Json(request): Json<AskRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::EmptyField("prompt"));
    }
    let answer = server.service().ask(&request).await;
    Ok(Json(serde_json::json!({ "answer": answer })))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
    limit: Option<usize>,
}

async fn search_handler(
    State(server): State<GuataServer>,
    Query(params): Query<SearchQuery>,
) -> Result<Response, ApiError> {
    if params.q.trim().is_empty() {
        return Err(ApiError::EmptyField("q"));
    }
    let analysis = server.search_engine().search(&params.q).await;
    match params.limit {
        Some(limit) if limit < analysis.results.len() => {
            let mut trimmed = analysis.as_ref().clone();
            trimmed.results.truncate(limit);
            Ok(Json(trimmed).into_response())
        }
        _ => Ok(Json(analysis.as_ref()).into_response()),
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// REST routes plus the MCP endpoint nested at `/mcp`, all sharing one
/// server (and therefore one search cache).
pub fn router(server: GuataServer) -> Router {
    use rmcp::transport::streamable_http_server::{
        session::local::LocalSessionManager, StreamableHttpService,
    };

    let mcp_server = server.clone();
    let service = StreamableHttpService::new(
        move || Ok(mcp_server.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    Router::new()
        .route("/api/ask", post(ask_handler))
        .route("/api/search", get(search_handler))
        .route("/health", get(health_handler))
        .with_state(server)
        .nest_service("/mcp", service)
}

/// Start the HTTP server on the given address until Ctrl+C or SIGTERM.
pub async fn run_http_server(
    config: GuataConfig,
    addr: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = GuataServer::from_config(&config)?;
    let app = router(server);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    tracing::info!("Guatá listening on http://{}/ (MCP at /mcp)", addr);
    eprintln!("Guatá listening on http://{}/ (MCP at /mcp)", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutting down HTTP server");
}
