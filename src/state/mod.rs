mod chat;
mod emitters;

pub use chat::ChatService;
pub use emitters::{BroadcastReport, EmitterRegistry, Subscription};

use crate::config::AppConfig;
use crate::protocol::ServerMessage;
use crate::types::{PushEvent, StatusReport};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Event name of the periodic clock push
pub const TIME_UPDATE_EVENT: &str = "time-update";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// Open SSE connections
    pub emitters: EmitterRegistry,
    pub chat: ChatService,
    /// Fan-out for messages published to topics; each WebSocket filters by
    /// its own subscriptions
    pub topic_broadcast: broadcast::Sender<ServerMessage>,
    /// Topic subscriptions held across all WebSocket connections
    pub(crate) topic_subscribers: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let (tx, _rx) = broadcast::channel(config.topic_capacity.max(1));
        Self {
            emitters: EmitterRegistry::new(config.emitter_queue_size),
            chat: ChatService::new(config.chat_history_limit),
            topic_broadcast: tx,
            topic_subscribers: Arc::new(AtomicUsize::new(0)),
            config,
        }
    }

    /// Push a named event to every SSE client
    pub fn send_event(&self, name: &str, data: impl Into<String>) -> BroadcastReport {
        self.emitters.broadcast(&PushEvent::new(name, data))
    }

    /// Push the current local time to every SSE client
    pub fn send_time_update(&self) -> BroadcastReport {
        self.send_event(TIME_UPDATE_EVENT, current_time())
    }

    /// Publish to topic subscribers. Returns how many connections saw it.
    pub fn publish(&self, msg: ServerMessage) -> usize {
        // No receivers connected is fine
        self.topic_broadcast.send(msg).unwrap_or(0)
    }

    pub async fn status(&self) -> StatusReport {
        StatusReport {
            active_emitters: self.emitters.len(),
            chat_messages: self.chat.len().await,
            topic_subscribers: self.topic_subscribers.load(Ordering::Relaxed),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

/// Local wall-clock time as `HH:MM:SS.mmm`
pub fn current_time() -> String {
    format_time(chrono::Local::now().time())
}

pub fn format_time(time: chrono::NaiveTime) -> String {
    time.format("%H:%M:%S%.3f").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_format_time() {
        let time = NaiveTime::from_hms_milli_opt(9, 5, 7, 42).unwrap();
        assert_eq!(format_time(time), "09:05:07.042");
    }

    #[tokio::test]
    async fn test_send_time_update() {
        let state = AppState::default();
        let mut sub = state.emitters.register();

        let report = state.send_time_update();
        assert_eq!(report.delivered, 1);

        let event = sub.recv().await.unwrap();
        assert_eq!(event.name, TIME_UPDATE_EVENT);
        assert!(NaiveTime::parse_from_str(&event.data, "%H:%M:%S%.3f").is_ok());
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let state = AppState::default();
        assert_eq!(state.publish(ServerMessage::Pong), 0);
    }

    #[tokio::test]
    async fn test_status() {
        let state = AppState::default();
        let _sub = state.emitters.register();
        // A connection listening on the channel without any topic subscribed
        let _rx = state.topic_broadcast.subscribe();

        let status = state.status().await;
        assert_eq!(
            status,
            StatusReport {
                active_emitters: 1,
                chat_messages: 0,
                topic_subscribers: 0,
            }
        );
    }
}
