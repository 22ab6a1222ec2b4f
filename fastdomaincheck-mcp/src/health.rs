//! Optional HTTP liveness endpoint for container probes.

use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// `GET /health` returns `200 {"status":"ok"}`.
pub fn router() -> Router {
    Router::new().route("/health", get(health_handler))
}

async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serve the health router on an already bound listener until the process exits.
pub async fn serve(listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, router()).await
}

/// Bind `0.0.0.0:port` and serve in a background task.
pub async fn spawn(port: u16) -> std::io::Result<tokio::task::JoinHandle<()>> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "health check server listening");

    Ok(tokio::spawn(async move {
        if let Err(e) = serve(listener).await {
            tracing::error!(error = %e, "health check server stopped");
        }
    }))
}
