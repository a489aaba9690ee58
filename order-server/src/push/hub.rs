use dashmap::DashMap;
use shared::message::PushEvent;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Serialized `{type, data}` text, shared by every queue
pub type PushFrame = Arc<str>;

pub type ConnectionId = u64;

/// Outcome of one broadcast
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Receiving side of one registered connection
pub struct PushConnection {
    pub id: ConnectionId,
    rx: mpsc::Receiver<PushFrame>,
}

impl PushConnection {
    /// Next frame, or `None` once the hub dropped this connection
    pub async fn recv(&mut self) -> Option<PushFrame> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<PushFrame> {
        self.rx.try_recv().ok()
    }
}

struct HubInner {
    connections: DashMap<ConnectionId, mpsc::Sender<PushFrame>>,
    next_id: AtomicU64,
    queue_capacity: usize,
}

/// Connection manager for the push channel
///
/// Owns the set of open connections. Callers only register, unregister
/// and broadcast; the set itself is never handed out.
#[derive(Clone)]
pub struct PushHub {
    inner: Arc<HubInner>,
}

impl std::fmt::Debug for PushHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushHub")
            .field("connections", &self.inner.connections.len())
            .field("queue_capacity", &self.inner.queue_capacity)
            .finish()
    }
}

impl PushHub {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            inner: Arc::new(HubInner {
                connections: DashMap::new(),
                next_id: AtomicU64::new(1),
                queue_capacity: queue_capacity.max(1),
            }),
        }
    }

    pub fn register(&self) -> PushConnection {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(self.inner.queue_capacity);
        self.inner.connections.insert(id, tx);
        tracing::debug!(connection_id = id, total = self.connection_count(), "Push connection registered");
        PushConnection { id, rx }
    }

    /// Returns false if `id` was not registered.
    pub fn unregister(&self, id: ConnectionId) -> bool {
        let removed = self.inner.connections.remove(&id).is_some();
        if removed {
            tracing::debug!(connection_id = id, total = self.connection_count(), "Push connection unregistered");
        }
        removed
    }

    pub fn connection_count(&self) -> usize {
        self.inner.connections.len()
    }

    /// Serialize `event` once and queue it on every connection.
    pub fn broadcast(&self, event: &PushEvent) -> BroadcastReport {
        let frame: PushFrame = match event.to_json() {
            Ok(json) => json.into(),
            Err(e) => {
                tracing::error!(event = %event.event_type(), "Failed to serialize push event: {e}");
                return BroadcastReport::default();
            }
        };
        let report = self.broadcast_frame(frame);
        tracing::debug!(
            event = %event.event_type(),
            order_id = %event.order_id(),
            delivered = report.delivered,
            failed = report.failed,
            "Push event broadcast"
        );
        report
    }

    /// Queue a pre-serialized frame on every connection.
    ///
    /// A full or closed queue counts as a failure for that connection only.
    /// Closed queues are unregistered once the sweep is done.
    pub fn broadcast_frame(&self, frame: PushFrame) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let mut closed = Vec::new();

        for entry in self.inner.connections.iter() {
            match entry.value().try_send(frame.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    report.failed += 1;
                    tracing::warn!(connection_id = *entry.key(), "Push queue full, dropping event");
                }
                Err(TrySendError::Closed(_)) => {
                    report.failed += 1;
                    closed.push(*entry.key());
                }
            }
        }

        // Removing while iterating would deadlock the shard
        for id in closed {
            self.unregister(id);
        }
        report
    }

    /// Drop every connection; their sessions see the end of the queue and close.
    pub fn close_all(&self) {
        let count = self.connection_count();
        self.inner.connections.clear();
        if count > 0 {
            tracing::info!(count, "Closed all push connections");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_every_connection() {
        let hub = PushHub::new(8);
        let mut a = hub.register();
        let mut b = hub.register();

        let report = hub.broadcast(&PushEvent::deleted("42"));
        assert_eq!(report, BroadcastReport { delivered: 2, failed: 0 });

        let expected = r#"{"type":"order_deleted","data":{"id":"42"}}"#;
        assert_eq!(a.try_recv().as_deref(), Some(expected));
        assert_eq!(b.try_recv().as_deref(), Some(expected));
    }

    #[test]
    fn one_broken_connection_does_not_stop_the_others() {
        let hub = PushHub::new(8);
        let mut conns: Vec<_> = (0..5).map(|_| hub.register()).collect();
        let broken = conns.remove(2);
        drop(broken);

        let report = hub.broadcast(&PushEvent::deleted("7"));
        assert_eq!(report, BroadcastReport { delivered: 4, failed: 1 });
        for conn in &mut conns {
            assert!(conn.try_recv().is_some());
        }
        // The dead connection is gone after the sweep
        assert_eq!(hub.connection_count(), 4);
    }

    #[test]
    fn full_queue_fails_only_that_connection() {
        let hub = PushHub::new(1);
        let mut slow = hub.register();
        let mut fast = hub.register();

        assert_eq!(hub.broadcast(&PushEvent::deleted("1")).delivered, 2);
        assert!(fast.try_recv().is_some());

        let report = hub.broadcast(&PushEvent::deleted("2"));
        assert_eq!(report, BroadcastReport { delivered: 1, failed: 1 });
        assert!(fast.try_recv().is_some());

        // Slow consumer keeps its slot and its first frame
        assert_eq!(hub.connection_count(), 2);
        assert!(slow.try_recv().unwrap().contains("\"1\""));
        assert!(slow.try_recv().is_none());
    }

    #[test]
    fn unregistered_connection_receives_nothing() {
        let hub = PushHub::new(8);
        let mut conn = hub.register();
        assert!(hub.unregister(conn.id));
        assert!(!hub.unregister(conn.id));

        let report = hub.broadcast(&PushEvent::deleted("1"));
        assert_eq!(report, BroadcastReport::default());
        assert!(conn.try_recv().is_none());
    }

    #[tokio::test]
    async fn close_all_ends_sessions() {
        let hub = PushHub::new(8);
        let mut conn = hub.register();
        hub.close_all();
        assert_eq!(conn.recv().await, None);
        assert_eq!(hub.connection_count(), 0);
    }
}
