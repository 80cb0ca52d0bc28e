//! Event system shared by all picomcp components.
//!
//! Every component that emits observability events defines its own
//! event enum implementing [`RuntimeEvent`] and carries an
//! [`EventListeners`] collection in its configuration. Listeners are
//! identified by stable [`ListenerId`] handles and can be removed by
//! id; a listener that panics is absorbed and counted rather than
//! unwinding through the core.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Trait for events emitted by picomcp components.
pub trait RuntimeEvent: fmt::Debug {
    /// Returns the type of event (e.g., "state_transition", "denied").
    fn event_type(&self) -> &'static str;

    /// Returns the monotonic millisecond timestamp of the event.
    fn at_ms(&self) -> u32;

    /// Returns the name of the component instance that emitted it.
    fn component(&self) -> &str;
}

/// Trait for listening to runtime events.
pub trait EventListener<E: RuntimeEvent>: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &E);
}

/// Stable handle identifying a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct ListenerEntry<E: RuntimeEvent> {
    id: ListenerId,
    listener: Arc<dyn EventListener<E>>,
    errors: Arc<AtomicU64>,
}

impl<E: RuntimeEvent> Clone for ListenerEntry<E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: Arc::clone(&self.listener),
            errors: Arc::clone(&self.errors),
        }
    }
}

/// A collection of event listeners with stable ids.
pub struct EventListeners<E: RuntimeEvent> {
    listeners: Vec<ListenerEntry<E>>,
    next_id: u64,
}

impl<E: RuntimeEvent> Clone for EventListeners<E> {
    fn clone(&self) -> Self {
        Self {
            listeners: self.listeners.clone(),
            next_id: self.next_id,
        }
    }
}

impl<E: RuntimeEvent> EventListeners<E> {
    /// Creates a new empty collection.
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
            next_id: 1,
        }
    }

    /// Adds a listener, returning the handle that removes it later.
    pub fn add<L>(&mut self, listener: L) -> ListenerId
    where
        L: EventListener<E> + 'static,
    {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(ListenerEntry {
            id,
            listener: Arc::new(listener),
            errors: Arc::new(AtomicU64::new(0)),
        });
        id
    }

    /// Removes the listener with the given id. Returns false if absent.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|entry| entry.id != id);
        self.listeners.len() != before
    }

    /// Emits an event to all registered listeners.
    ///
    /// A panicking listener is caught so the remaining listeners still
    /// run; its failure is recorded in a per-listener error counter
    /// readable through [`error_count`](Self::error_count).
    pub fn emit(&self, event: &E) {
        for entry in &self.listeners {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                entry.listener.on_event(event);
            }));

            if result.is_err() {
                entry.errors.fetch_add(1, Ordering::Relaxed);

                #[cfg(feature = "tracing")]
                tracing::warn!(
                    component = event.component(),
                    event_type = event.event_type(),
                    "event listener panicked"
                );

                #[cfg(feature = "metrics")]
                metrics::counter!(
                    "picomcp_listener_failures_total",
                    "component" => event.component().to_string(),
                    "event_type" => event.event_type().to_string()
                )
                .increment(1);
            }
        }
    }

    /// Returns the number of absorbed failures for a listener, or
    /// `None` if the id is unknown.
    pub fn error_count(&self, id: ListenerId) -> Option<u64> {
        self.listeners
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.errors.load(Ordering::Relaxed))
    }

    /// Returns true if there are no listeners.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Returns the number of listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }
}

impl<E: RuntimeEvent> Default for EventListeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// A simple function-based event listener.
pub struct FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    f: F,
    _phantom: std::marker::PhantomData<fn(&E)>,
}

impl<E, F> FnListener<E, F>
where
    F: Fn(&E) + Send + Sync,
{
    /// Creates a new function-based listener.
    pub fn new(f: F) -> Self {
        Self {
            f,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<E, F> EventListener<E> for FnListener<E, F>
where
    E: RuntimeEvent,
    F: Fn(&E) + Send + Sync,
{
    fn on_event(&self, event: &E) {
        (self.f)(event)
    }
}
