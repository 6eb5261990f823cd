use anyhow::Result;
use axum::{
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use bugzilla_mcp::McpServer;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

mod handlers;

/// Start the HTTP server and run until interrupted
pub async fn serve(addr: &str, server: Arc<McpServer>) -> Result<()> {
    let app = create_router(server);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("MCP endpoint listening on http://{}/mcp", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Create the router
pub fn create_router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/mcp", post(handlers::handle_mcp))
        .route("/health", get(health_check))
        // Headers carry the callers' API keys and stay out of spans.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(server)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "mcp-bugzilla",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}
