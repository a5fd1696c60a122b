//! HTTP API endpoints for inspecting server state.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::protocol::ChatMessageDto;
use crate::state::AppState;
use crate::types::StatusReport;

/// Chat history, oldest first.
///
/// GET /api/chat/messages
pub async fn list_messages(State(state): State<Arc<AppState>>) -> Json<Vec<ChatMessageDto>> {
    let messages = state
        .chat
        .history()
        .await
        .into_iter()
        .map(ChatMessageDto::from)
        .collect();
    Json(messages)
}

/// Live connection and history counts.
///
/// GET /api/status
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    Json(state.status().await)
}
