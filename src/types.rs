use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque ID for one registered push-stream connection
pub type EmitterId = String;

/// Messaging destination, e.g. `/topic/messages`
pub type Destination = String;

/// A chat message as held in history.
///
/// `timestamp` is always assigned by the server when the message is received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A named server-push event, written to the stream as one SSE frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    pub name: String,
    pub data: String,
}

impl PushEvent {
    pub fn new(name: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

/// Snapshot of server activity served by `/api/status`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusReport {
    pub active_emitters: usize,
    pub chat_messages: usize,
    pub topic_subscribers: usize,
}
