//! HTTP API server — the seam the browser UI renders against
//!
//! The UI itself (theme, layout, framework) lives elsewhere; it invokes the
//! session through these endpoints and renders the transcript and status it
//! reads back.

pub mod chat;
pub mod health;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::session::Session;

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub session: Arc<Session>,
}

/// Build the full API router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api", chat::router(state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Serve the API until interrupted
///
/// # Errors
///
/// Returns error if the listener cannot bind or the server fails
pub async fn serve(state: Arc<ApiState>, port: u16) -> Result<()> {
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "API server listening");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
