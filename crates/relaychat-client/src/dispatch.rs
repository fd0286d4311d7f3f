//! Inbound event fan-out.
//!
//! A [`Dispatcher`] routes inbound envelopes to handlers registered per
//! event name. Each registration returns a [`Subscription`] guard that owns
//! its own removal: dropping the guard unsubscribes, so handlers cannot
//! leak across reconnects or component teardown the way manually paired
//! add/remove calls can.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use relaychat_proto::Envelope;

type Handler = Box<dyn FnMut(&Envelope) + Send>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    // Per event name, in registration order.
    handlers: HashMap<String, Vec<(u64, Handler)>>,
}

/// Routes inbound envelopes to per-event-name handlers.
///
/// Multiple handlers per event name are allowed; for each inbound envelope
/// they run in registration order. Handlers must not call back into the
/// dispatcher they are registered with.
#[derive(Clone, Default)]
pub struct Dispatcher {
    inner: Arc<Mutex<Registry>>,
}

impl Dispatcher {
    /// Create a dispatcher with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        // Handlers are plain FnMuts; a panic mid-dispatch leaves no
        // broken registry state worth rejecting.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `handler` for envelopes named `event`.
    ///
    /// The handler stays registered until the returned guard is dropped.
    pub fn subscribe(
        &self,
        event: impl Into<String>,
        handler: impl FnMut(&Envelope) + Send + 'static,
    ) -> Subscription {
        let event = event.into();
        let mut registry = self.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.handlers.entry(event.clone()).or_default().push((id, Box::new(handler)));

        Subscription { event, id, registry: Arc::downgrade(&self.inner) }
    }

    /// Deliver an envelope to every handler subscribed to its event name.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, envelope: &Envelope) -> usize {
        let mut registry = self.lock();
        let Some(handlers) = registry.handlers.get_mut(envelope.event.name()) else {
            return 0;
        };

        for (_, handler) in handlers.iter_mut() {
            handler(envelope);
        }
        handlers.len()
    }

    /// Number of live subscriptions for `event`.
    pub fn subscriber_count(&self, event: &str) -> usize {
        self.lock().handlers.get(event).map_or(0, Vec::len)
    }
}

/// Scoped handle to one registered handler.
///
/// Dropping the subscription removes the handler from its dispatcher.
pub struct Subscription {
    event: String,
    id: u64,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Event name this subscription listens for.
    pub fn event(&self) -> &str {
        &self.event
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(handlers) = registry.handlers.get_mut(&self.event) {
            handlers.retain(|(id, _)| *id != self.id);
            if handlers.is_empty() {
                registry.handlers.remove(&self.event);
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("event", &self.event).field("id", &self.id).finish()
    }
}
