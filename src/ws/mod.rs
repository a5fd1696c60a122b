pub mod chat;
pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::protocol::{self, ServerMessage};
use crate::state::AppState;

pub use handlers::Subscriptions;

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request");

    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn encode(msg: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(Message::Text(json.into())),
        Err(e) => {
            tracing::error!("Failed to encode server message: {}", e);
            None
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    if let Some(welcome) = encode(&ServerMessage::welcome()) {
        if sender.send(welcome).await.is_err() {
            tracing::error!("Failed to send welcome message");
            return;
        }
    }

    // Subscribed before any client frame is read so nothing published after
    // a `subscribed` reply can be missed
    let mut topic_rx = state.topic_broadcast.subscribe();
    let mut subscriptions = Subscriptions::new(&state);

    loop {
        tokio::select! {
            published = topic_rx.recv() => {
                match published {
                    Ok(msg) => {
                        if !subscriptions.accepts(&msg) {
                            continue;
                        }
                        if let Some(frame) = encode(&msg) {
                            if sender.send(frame).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("WebSocket lagging, skipped {} topic messages", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text.as_str());

                        let response = match protocol::decode(text.as_str()) {
                            Ok(client_msg) => {
                                handlers::handle_message(client_msg, &mut subscriptions, &state).await
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::from(e))
                            }
                        };

                        if let Some(frame) = response.as_ref().and_then(encode) {
                            if sender.send(frame).await.is_err() {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!(
        "WebSocket connection closed ({} subscriptions)",
        subscriptions.len()
    );
}
