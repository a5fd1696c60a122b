//! WebSocket message dispatch
//!
//! Routes client frames by destination: topic subscriptions are tracked per
//! connection, application destinations are handed to their handler module.

use crate::protocol::{
    ClientMessage, ProtocolError, ServerMessage, CHAT_SEND_DESTINATION, MESSAGES_TOPIC,
};
use crate::state::AppState;
use crate::types::Destination;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::chat;

const TOPICS: &[&str] = &[MESSAGES_TOPIC];

/// Topics one connection is subscribed to.
///
/// Keeps the server-wide subscriber count in step: every topic held here is
/// counted once, and dropping the set releases all of them.
#[derive(Debug)]
pub struct Subscriptions {
    topics: HashSet<Destination>,
    counter: Arc<AtomicUsize>,
}

impl Subscriptions {
    pub fn new(state: &AppState) -> Self {
        Self {
            topics: HashSet::new(),
            counter: state.topic_subscribers.clone(),
        }
    }

    /// Returns false if the topic was already subscribed
    fn add(&mut self, destination: Destination) -> bool {
        let added = self.topics.insert(destination);
        if added {
            self.counter.fetch_add(1, Ordering::Relaxed);
        }
        added
    }

    /// Returns false if the topic was not subscribed
    fn remove(&mut self, destination: &str) -> bool {
        let removed = self.topics.remove(destination);
        if removed {
            self.counter.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    pub fn contains(&self, destination: &str) -> bool {
        self.topics.contains(destination)
    }

    /// Whether a published message should be forwarded to this connection
    pub fn accepts(&self, msg: &ServerMessage) -> bool {
        match msg {
            ServerMessage::Message { destination, .. } => self.contains(destination),
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        self.counter.fetch_sub(self.topics.len(), Ordering::Relaxed);
    }
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    subscriptions: &mut Subscriptions,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Subscribe { destination } => {
            if !TOPICS.contains(&destination.as_str()) {
                return Some(ProtocolError::UnknownDestination(destination).into());
            }
            tracing::info!("Subscribed to {}", destination);
            subscriptions.add(destination.clone());
            Some(ServerMessage::Subscribed { destination })
        }

        ClientMessage::Unsubscribe { destination } => {
            subscriptions.remove(&destination);
            Some(ServerMessage::Unsubscribed { destination })
        }

        ClientMessage::Send { destination, body } => match destination.as_str() {
            CHAT_SEND_DESTINATION => {
                let published = chat::handle_chat_send(state, body).await;
                state.publish(ServerMessage::Message {
                    destination: MESSAGES_TOPIC.to_string(),
                    body: published,
                });
                None
            }
            _ => Some(ProtocolError::UnknownDestination(destination).into()),
        },

        ClientMessage::Ping => Some(ServerMessage::Pong),
    }
}
