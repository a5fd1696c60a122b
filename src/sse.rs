//! Server-Sent Events endpoint

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use std::convert::Infallible;
use std::sync::Arc;

use crate::state::AppState;
use crate::types::PushEvent;

/// Open a push stream for this client.
///
/// GET /api/sse
///
/// The stream stays open until the client goes away or its emitter is pruned.
pub async fn sse_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.emitters.register();
    let stream = subscription.map(|event| Ok(to_sse_event(event)));

    Sse::new(stream).keep_alive(KeepAlive::new().interval(state.config.sse_keep_alive))
}

fn to_sse_event(event: PushEvent) -> Event {
    Event::default().event(event.name).data(event.data)
}
