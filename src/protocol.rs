use crate::types::{ChatMessage, Destination};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

/// Application destination handled by the chat handler
pub const CHAT_SEND_DESTINATION: &str = "/app/chat.send";

/// Topic every accepted chat message is published to
pub const MESSAGES_TOPIC: &str = "/topic/messages";

/// Chat message as it travels over the wire
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessageDto {
    pub sender: String,
    pub content: String,
    /// Ignored on input, always set by the server on output
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ChatMessageDto {
    /// Map to the domain message, stamping it with its receipt time
    pub fn into_message(self, received_at: DateTime<Utc>) -> ChatMessage {
        ChatMessage {
            sender: self.sender,
            content: self.content,
            timestamp: received_at,
        }
    }
}

impl From<ChatMessage> for ChatMessageDto {
    fn from(message: ChatMessage) -> Self {
        Self {
            sender: message.sender,
            content: message.content,
            timestamp: Some(message.timestamp),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    Subscribe {
        destination: Destination,
    },
    Unsubscribe {
        destination: Destination,
    },
    Send {
        destination: Destination,
        body: ChatMessageDto,
    },
    Ping,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        server_now: String,
    },
    Subscribed {
        destination: Destination,
    },
    Unsubscribed {
        destination: Destination,
    },
    /// Delivery of a message published to a topic
    Message {
        destination: Destination,
        body: ChatMessageDto,
    },
    Pong,
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn welcome() -> Self {
        ServerMessage::Welcome {
            protocol: PROTOCOL_VERSION.to_string(),
            server_now: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("Invalid message format: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Unknown destination: {0}")]
    UnknownDestination(Destination),
}

impl ProtocolError {
    pub fn code(&self) -> &'static str {
        match self {
            ProtocolError::Parse(_) => "PARSE_ERROR",
            ProtocolError::UnknownDestination(_) => "UNKNOWN_DESTINATION",
        }
    }
}

impl From<ProtocolError> for ServerMessage {
    fn from(err: ProtocolError) -> Self {
        ServerMessage::Error {
            code: err.code().to_string(),
            msg: err.to_string(),
        }
    }
}

/// Decode one text frame from a client
pub fn decode(text: &str) -> Result<ClientMessage, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}
