//! Lifecycle-bound listener registrations

use crate::events::dispatcher::{EventDispatcher, ListenerId};
use std::sync::Weak;

/// A registration that is removed when the handle is dropped or released.
///
/// Holds only a weak reference, so an outstanding subscription never keeps a
/// dispatcher alive.
#[must_use = "dropping a Subscription unregisters its handler immediately"]
pub struct Subscription {
    dispatcher: Weak<EventDispatcher>,
    event: String,
    id: ListenerId,
    active: bool,
}

impl Subscription {
    pub(crate) fn new(dispatcher: Weak<EventDispatcher>, event: String, id: ListenerId) -> Self {
        Self {
            dispatcher,
            event,
            id,
            active: true,
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Unregister now
    pub fn release(mut self) {
        self.unregister();
    }

    /// Keep the handler registered for the dispatcher's lifetime
    pub fn detach(mut self) {
        self.active = false;
    }

    fn unregister(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(dispatcher) = self.dispatcher.upgrade() {
            dispatcher.remove_listener(&self.event, self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unregister();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}

/// Collects a component's subscriptions and releases them together on teardown
#[derive(Debug, Default)]
pub struct SubscriptionScope {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionScope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release every held subscription
    pub fn release_all(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.release();
        }
    }
}

impl Drop for SubscriptionScope {
    fn drop(&mut self) {
        self.release_all();
    }
}
