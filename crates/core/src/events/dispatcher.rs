//! Synchronous publish/subscribe dispatcher

use crate::events::event::{Event, EventDetail};
use crate::events::subscription::Subscription;
use crate::types::Toast;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Failure reported by a handler; logged by the dispatcher, never propagated
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

pub type HandlerResult = std::result::Result<(), HandlerError>;

/// A registered callback. Identity for [`EventDispatcher::off`] is the `Arc` allocation.
pub type Handler = Arc<dyn Fn(&Event) -> HandlerResult + Send + Sync>;

/// Wrap a closure as a [`Handler`]
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&Event) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Identifies one registration, even when the same handler is registered twice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registration {
    id: ListenerId,
    handler: Handler,
}

/// Outcome of a single [`EventDispatcher::dispatch`] call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers invoked
    pub delivered: usize,
    /// Handlers that returned an error or panicked
    pub failed: usize,
}

/// Name-keyed event bus.
///
/// Handlers for one event run synchronously, in registration order, on the
/// dispatching thread. The registry lock is released before any handler runs,
/// so handlers may register, unregister or dispatch without deadlocking; a
/// registration made during a dispatch does not receive that dispatch.
pub struct EventDispatcher {
    listeners: RwLock<HashMap<String, Vec<Registration>>>,
    next_id: AtomicU64,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.listeners.read();
        let counts: HashMap<&str, usize> = listeners
            .iter()
            .map(|(name, regs)| (name.as_str(), regs.len()))
            .collect();
        f.debug_struct("EventDispatcher")
            .field("listeners", &counts)
            .finish()
    }
}

impl EventDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register `handler` for every future dispatch of `event`.
    ///
    /// No deduplication: registering the same handler twice invokes it twice.
    pub fn on(&self, event: impl Into<String>, handler: Handler) -> ListenerId {
        let event = event.into();
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.listeners.write();
        let registrations = listeners.entry(event.clone()).or_default();
        registrations.push(Registration { id, handler });
        debug!(
            event = %event,
            listeners = registrations.len(),
            "Event listener registered"
        );
        id
    }

    /// Register `handler` and return a handle that unregisters it when dropped
    pub fn subscribe(self: &Arc<Self>, event: impl Into<String>, handler: Handler) -> Subscription {
        let event = event.into();
        let id = self.on(event.clone(), handler);
        Subscription::new(Arc::downgrade(self), event, id)
    }

    /// Remove exactly one registration of `handler` for `event`.
    ///
    /// Returns false when no registration matched.
    pub fn off(&self, event: &str, handler: &Handler) -> bool {
        self.remove_where(event, |reg| Arc::ptr_eq(&reg.handler, handler))
    }

    /// Remove the registration identified by `id`
    pub fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        self.remove_where(event, |reg| reg.id == id)
    }

    fn remove_where(&self, event: &str, predicate: impl Fn(&Registration) -> bool) -> bool {
        let mut listeners = self.listeners.write();
        let Some(registrations) = listeners.get_mut(event) else {
            return false;
        };
        let Some(index) = registrations.iter().position(predicate) else {
            return false;
        };
        registrations.remove(index);
        if registrations.is_empty() {
            listeners.remove(event);
        }
        debug!(event = %event, "Event listener removed");
        true
    }

    /// Invoke every handler currently registered for `event`.
    ///
    /// A handler that fails or panics is logged and does not stop the
    /// handlers after it.
    pub fn dispatch(&self, event: impl Into<String>, detail: impl Into<EventDetail>) -> DispatchReport {
        let event = Event::new(event, detail);
        let handlers: Vec<Handler> = {
            let listeners = self.listeners.read();
            match listeners.get(&event.name) {
                Some(registrations) => registrations.iter().map(|r| Arc::clone(&r.handler)).collect(),
                None => Vec::new(),
            }
        };

        let mut report = DispatchReport::default();
        for handler in handlers {
            report.delivered += 1;
            match catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(event = %event.name, error = %e, "Event handler failed");
                }
                Err(payload) => {
                    report.failed += 1;
                    error!(
                        event = %event.name,
                        panic = %panic_message(payload.as_ref()),
                        "Event handler panicked"
                    );
                }
            }
        }

        debug!(
            event = %event.name,
            delivered = report.delivered,
            failed = report.failed,
            "Event dispatched"
        );
        report
    }

    /// Dispatch a `tpen-toast` event
    pub fn toast(&self, toast: Toast) -> DispatchReport {
        self.dispatch(crate::constants::EVENT_TOAST, toast)
    }

    /// Number of registrations for `event`
    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.read().get(event).map_or(0, Vec::len)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
