//! Registry of open push-stream connections
//!
//! Every SSE client owns a bounded queue. The registry keeps the sending half
//! of each queue and fans events out to all of them. A queue that can no longer
//! accept an event (client gone, or client stopped reading) is dropped from the
//! registry on the spot.

use crate::types::{EmitterId, PushEvent};
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::task::{Context, Poll};
use tokio::sync::mpsc::{self, error::TrySendError};

/// Outcome of a single broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub removed: usize,
}

type Emitters = HashMap<EmitterId, mpsc::Sender<PushEvent>>;

/// Shared set of live emitters. Cheap to clone.
#[derive(Clone)]
pub struct EmitterRegistry {
    emitters: Arc<RwLock<Emitters>>,
    queue_size: usize,
}

impl EmitterRegistry {
    pub fn new(queue_size: usize) -> Self {
        Self {
            emitters: Arc::new(RwLock::new(HashMap::new())),
            queue_size: queue_size.max(1),
        }
    }

    // The lock is never held across an await or a panic-prone call, so a
    // poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, Emitters> {
        self.emitters.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Emitters> {
        self.emitters.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a new emitter and return the stream of events it will receive
    pub fn register(&self) -> Subscription {
        let id = ulid::Ulid::new().to_string();
        let (tx, rx) = mpsc::channel(self.queue_size);

        let total = {
            let mut emitters = self.write();
            emitters.insert(id.clone(), tx);
            emitters.len()
        };
        tracing::info!("New SSE emitter {} added. Total: {}", id, total);

        Subscription {
            id,
            rx,
            registry: self.clone(),
        }
    }

    /// Remove an emitter. Returns false if it was already gone.
    pub fn unregister(&self, id: &str) -> bool {
        self.write().remove(id).is_some()
    }

    /// Send `event` to every registered emitter, dropping the ones that fail
    pub fn broadcast(&self, event: &PushEvent) -> BroadcastReport {
        // Snapshot so writes happen without the lock held; emitters registered
        // after this point miss this event.
        let targets: Vec<(EmitterId, mpsc::Sender<PushEvent>)> = self
            .read()
            .iter()
            .map(|(id, tx)| (id.clone(), tx.clone()))
            .collect();

        tracing::info!(
            "Sending '{}' event to {} clients",
            event.name,
            targets.len()
        );

        let mut report = BroadcastReport::default();
        for (id, tx) in targets {
            match tx.try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    let reason = match err {
                        TrySendError::Closed(_) => "connection closed",
                        TrySendError::Full(_) => "client not reading",
                    };
                    if self.unregister(&id) {
                        report.removed += 1;
                        tracing::warn!("Emitter {} is dead ({}). Removed it", id, reason);
                    }
                }
            }
        }

        report
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

/// Receiving side of one emitter.
///
/// Yields every event broadcast while it is registered. Dropping it removes
/// the emitter from the registry.
pub struct Subscription {
    id: EmitterId,
    rx: mpsc::Receiver<PushEvent>,
    registry: EmitterRegistry,
}

impl Subscription {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub async fn recv(&mut self) -> Option<PushEvent> {
        self.rx.recv().await
    }

    /// Stop accepting events. Already queued events can still be received.
    pub fn close(&mut self) {
        self.rx.close();
    }
}

impl Stream for Subscription {
    type Item = PushEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<PushEvent>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.registry.unregister(&self.id) {
            tracing::info!(
                "Emitter {} completed. Total: {}",
                self.id,
                self.registry.len()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn tick(n: u32) -> PushEvent {
        PushEvent::new("tick", n.to_string())
    }

    #[tokio::test]
    async fn test_register_adds_emitter() {
        let registry = EmitterRegistry::new(8);
        assert!(registry.is_empty());

        let a = registry.register();
        let b = registry.register();

        assert_eq!(registry.len(), 2);
        assert_ne!(a.id(), b.id());
    }

    #[tokio::test]
    async fn test_broadcast_reaches_all_emitters() {
        let registry = EmitterRegistry::new(8);
        let mut a = registry.register();
        let mut b = registry.register();
        let mut c = registry.register();

        let report = registry.broadcast(&tick(1));

        assert_eq!(
            report,
            BroadcastReport {
                delivered: 3,
                removed: 0
            }
        );
        assert_eq!(a.recv().await, Some(tick(1)));
        assert_eq!(b.recv().await, Some(tick(1)));
        assert_eq!(c.recv().await, Some(tick(1)));
    }

    #[tokio::test]
    async fn test_broadcast_with_no_emitters() {
        let registry = EmitterRegistry::new(8);
        assert_eq!(registry.broadcast(&tick(1)), BroadcastReport::default());
    }

    #[tokio::test]
    async fn test_closed_emitter_is_removed_alone() {
        let registry = EmitterRegistry::new(8);
        let mut alive = registry.register();
        let mut dead = registry.register();
        dead.close();

        let report = registry.broadcast(&tick(1));

        assert_eq!(report.delivered, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(alive.recv().await, Some(tick(1)));
        assert_eq!(dead.recv().await, None);

        // Pruned emitter stays gone
        let report = registry.broadcast(&tick(2));
        assert_eq!(report.delivered, 1);
        assert_eq!(report.removed, 0);
    }

    #[tokio::test]
    async fn test_stalled_emitter_is_removed() {
        let registry = EmitterRegistry::new(1);
        let mut reader = registry.register();
        let stalled = registry.register();

        registry.broadcast(&tick(1));
        assert_eq!(reader.recv().await, Some(tick(1)));

        // `stalled` still holds tick 1, so its queue is full
        let report = registry.broadcast(&tick(2));
        assert_eq!(report.delivered, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(registry.len(), 1);
        assert_eq!(reader.recv().await, Some(tick(2)));

        drop(stalled);
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_pruned_subscription_drains_then_ends() {
        let registry = EmitterRegistry::new(1);
        let mut stalled = registry.register();

        registry.broadcast(&tick(1));
        registry.broadcast(&tick(2));

        assert!(registry.is_empty());
        assert_eq!(stalled.recv().await, Some(tick(1)));
        assert_eq!(stalled.recv().await, None);
    }

    #[tokio::test]
    async fn test_drop_unregisters() {
        let registry = EmitterRegistry::new(8);
        let a = registry.register();
        let _b = registry.register();
        let id = a.id().to_string();

        drop(a);

        assert_eq!(registry.len(), 1);
        assert!(!registry.unregister(&id));
    }

    #[tokio::test]
    async fn test_unregister_is_idempotent() {
        let registry = EmitterRegistry::new(8);
        let sub = registry.register();

        assert!(registry.unregister(sub.id()));
        assert!(!registry.unregister(sub.id()));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_subscription_is_a_stream() {
        let registry = EmitterRegistry::new(8);
        let sub = registry.register();

        registry.broadcast(&tick(1));
        registry.broadcast(&tick(2));

        let events: Vec<PushEvent> = sub.take(2).collect().await;
        assert_eq!(events, vec![tick(1), tick(2)]);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_register_during_broadcasts() {
        let registry = EmitterRegistry::new(256);
        let mut subs = Vec::new();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    for n in 0..16 {
                        registry.broadcast(&tick(n));
                        tokio::task::yield_now().await;
                    }
                })
            })
            .collect();

        for _ in 0..16 {
            subs.push(registry.register());
            tokio::task::yield_now().await;
        }

        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(registry.len(), 16);
    }
}
