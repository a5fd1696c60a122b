//! Chat message handlers

use crate::protocol::ChatMessageDto;
use crate::state::AppState;
use std::sync::Arc;

/// Accept a chat message: stamp it, record it, and return what gets published
pub async fn handle_chat_send(state: &Arc<AppState>, dto: ChatMessageDto) -> ChatMessageDto {
    let message = dto.into_message(chrono::Utc::now());
    state.chat.add_message(message.clone()).await;
    ChatMessageDto::from(message)
}
