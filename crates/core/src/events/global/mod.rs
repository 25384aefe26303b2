//! Process-wide dispatcher
//!
//! Components should take an injected `Arc<EventDispatcher>`; this instance
//! exists for code that has no owner to receive one from.

use crate::events::dispatcher::EventDispatcher;
use crate::events::event::EventDetail;
use crate::events::DispatchReport;
use std::sync::Arc;
use tracing::debug;

/// Global dispatcher instance
static GLOBAL_DISPATCHER: std::sync::OnceLock<Arc<EventDispatcher>> = std::sync::OnceLock::new();

/// Get the global dispatcher (initializing it on first access)
pub fn global_dispatcher() -> Arc<EventDispatcher> {
    GLOBAL_DISPATCHER
        .get_or_init(|| {
            debug!("Auto-initializing global event dispatcher");
            EventDispatcher::new()
        })
        .clone()
}

/// Dispatch on the global dispatcher
pub fn dispatch_global(event: impl Into<String>, detail: impl Into<EventDetail>) -> DispatchReport {
    global_dispatcher().dispatch(event, detail)
}
