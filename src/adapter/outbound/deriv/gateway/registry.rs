//! Subscription registry: server stream id to frame handler.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::adapter::outbound::deriv::dto::Envelope;
use crate::domain::SubscriptionId;

type FrameHandler = Box<dyn FnMut(Envelope) + Send>;

/// A shareable stream handler.
///
/// Handlers are called from the connection's reader task, one frame at a
/// time and in arrival order.
#[derive(Clone)]
pub struct StreamHandler(Arc<Mutex<FrameHandler>>);

impl StreamHandler {
    pub fn new(handler: impl FnMut(Envelope) + Send + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(handler))))
    }

    pub fn call(&self, envelope: Envelope) {
        let mut handler = self.0.lock();
        handler(envelope);
    }
}

impl std::fmt::Debug for StreamHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StreamHandler")
    }
}

/// Live subscriptions of one connection.
#[derive(Default)]
pub struct SubscriptionRegistry {
    handlers: Mutex<HashMap<SubscriptionId, StreamHandler>>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a handler. A repeated id replaces the previous handler.
    pub fn insert(&self, id: SubscriptionId, handler: StreamHandler) {
        trace!(subscription = %id, "Registering stream handler");
        self.handlers.lock().insert(id, handler);
    }

    /// Forget a subscription. Returns whether it was registered.
    pub fn remove(&self, id: &SubscriptionId) -> bool {
        self.handlers.lock().remove(id).is_some()
    }

    /// Hand a frame to the handler registered for `id`.
    ///
    /// The table lock is released before the handler runs, so handlers may
    /// unsubscribe themselves. Returns `false` if nothing is registered.
    pub fn dispatch(&self, id: &SubscriptionId, envelope: Envelope) -> bool {
        let handler = self.handlers.lock().get(id).cloned();
        match handler {
            Some(handler) => {
                handler.call(envelope);
                true
            }
            None => false,
        }
    }

    /// Drop every subscription, returning how many there were.
    pub fn clear(&self) -> usize {
        let mut handlers = self.handlers.lock();
        let count = handlers.len();
        handlers.clear();
        count
    }

    #[must_use]
    pub fn contains(&self, id: &SubscriptionId) -> bool {
        self.handlers.lock().contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
