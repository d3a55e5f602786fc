//! Log broadcast bus
//!
//! Fans progress lines out to every live subscriber of a session. Each
//! subscriber owns an unbounded queue, so publishing never blocks and works
//! the same from the serving loop and from worker threads
//! (`UnboundedSender::send` is thread-safe and synchronous). Slow or absent
//! consumers never stall the publisher.

use super::registry::Session;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Subscriber fan-out set for one session
#[derive(Default)]
pub struct LogBus {
    subscribers: Mutex<Vec<(Uuid, mpsc::UnboundedSender<String>)>>,
}

impl LogBus {
    /// Deliver `line` to every currently registered subscriber exactly once.
    ///
    /// Subscribers whose receiving end is gone are pruned on the way.
    pub fn publish(&self, line: &str) {
        let mut subscribers = self.subscribers.lock().expect("log bus lock poisoned");
        subscribers.retain(|(id, tx)| {
            let delivered = tx.send(line.to_string()).is_ok();
            if !delivered {
                debug!(subscriber = %id, "Dropping disconnected log subscriber");
            }
            delivered
        });
    }

    /// Register a new subscriber queue, returning its id and receiver
    pub fn subscribe(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.subscribers
            .lock()
            .expect("log bus lock poisoned")
            .push((id, tx));
        (id, rx)
    }

    /// Remove one subscriber; safe to call while publishers are active
    pub fn unsubscribe(&self, id: Uuid) {
        self.subscribers
            .lock()
            .expect("log bus lock poisoned")
            .retain(|(sub_id, _)| *sub_id != id);
    }

    /// Current number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().expect("log bus lock poisoned").len()
    }
}

/// Unsubscribes its subscriber when dropped.
///
/// Held by the streaming connection so client disconnects unregister the
/// subscriber from its session.
pub struct SubscriberGuard {
    session: Arc<Session>,
    id: Uuid,
}

impl SubscriberGuard {
    pub fn new(session: Arc<Session>, id: Uuid) -> Self {
        Self { session, id }
    }
}

impl Drop for SubscriberGuard {
    fn drop(&mut self) {
        self.session.bus.unsubscribe(self.id);
    }
}
