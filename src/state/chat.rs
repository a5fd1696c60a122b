use crate::types::ChatMessage;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory chat history, oldest first. Lives as long as the process.
#[derive(Clone)]
pub struct ChatService {
    messages: Arc<RwLock<VecDeque<ChatMessage>>>,
    history_limit: usize,
}

impl ChatService {
    pub fn new(history_limit: usize) -> Self {
        Self {
            messages: Arc::new(RwLock::new(VecDeque::new())),
            history_limit: history_limit.max(1),
        }
    }

    /// Record a message, evicting the oldest one when history is full
    pub async fn add_message(&self, message: ChatMessage) {
        tracing::info!(
            "New chat message from {}: {}",
            message.sender,
            message.content
        );

        let mut messages = self.messages.write().await;
        if messages.len() >= self.history_limit {
            messages.pop_front();
        }
        messages.push_back(message);
    }

    pub async fn history(&self) -> Vec<ChatMessage> {
        self.messages.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(sender: &str, content: &str) -> ChatMessage {
        ChatMessage {
            sender: sender.to_string(),
            content: content.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_add_message() {
        let chat = ChatService::new(10);
        assert!(chat.is_empty().await);

        chat.add_message(message("alice", "hi")).await;
        chat.add_message(message("bob", "hey")).await;

        let history = chat.history().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].sender, "alice");
        assert_eq!(history[1].sender, "bob");
    }

    #[tokio::test]
    async fn test_history_evicts_oldest() {
        let chat = ChatService::new(2);

        chat.add_message(message("alice", "one")).await;
        chat.add_message(message("alice", "two")).await;
        chat.add_message(message("alice", "three")).await;

        let contents: Vec<String> = chat
            .history()
            .await
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents, vec!["two", "three"]);
        assert_eq!(chat.len().await, 2);
    }
}
