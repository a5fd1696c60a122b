pub mod api;
pub mod broadcast;
pub mod config;
pub mod protocol;
pub mod sse;
pub mod state;
pub mod types;
pub mod ws;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::state::AppState;

/// Directory served for any path no route matches
pub const STATIC_DIR: &str = "static";

/// Build the HTTP router with every endpoint wired to `state`
pub fn router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/sse", get(sse::sse_handler))
        .route("/api/chat/messages", get(api::list_messages))
        .route("/api/status", get(api::status));

    Router::new()
        .merge(api_routes)
        .route("/ws", get(ws::ws_handler))
        .fallback_service(ServeDir::new(STATIC_DIR))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
