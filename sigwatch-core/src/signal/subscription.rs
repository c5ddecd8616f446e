//! Subscription handles.

use std::fmt;

use super::context::ContextKey;
use super::hub::EventHub;
use super::listener::Listener;

/// Handle to one registration on a hub.
///
/// Dropping the handle leaves the listener registered; call
/// [`Subscription::unsubscribe`] to remove it.
#[must_use = "dropping a Subscription keeps the listener registered with no way to remove it"]
pub struct Subscription<T> {
    hub: EventHub<T>,
    listener: Listener<T>,
    context: ContextKey,
}

impl<T> Subscription<T> {
    pub(crate) fn new(hub: EventHub<T>, listener: Listener<T>, context: ContextKey) -> Self {
        Self {
            hub,
            listener,
            context,
        }
    }

    /// The registered listener.
    pub fn listener(&self) -> &Listener<T> {
        &self.listener
    }

    /// The context the listener is registered under.
    pub fn context(&self) -> ContextKey {
        self.context
    }

    /// Whether the listener is still registered.
    ///
    /// Turns false once a one-shot listener has fired.
    pub fn is_active(&self) -> bool {
        self.hub.contains(&self.listener, self.context)
    }

    /// Remove exactly this registration from the hub.
    pub fn unsubscribe(self) {
        self.hub.unsubscribe_in(&self.listener, self.context);
    }
}

impl<T> EventHub<T> {
    /// Register a durable listener under the default context and return a
    /// handle that can remove it.
    pub fn listen(&self, listener: Listener<T>) -> Subscription<T> {
        let context = self.default_context();
        self.subscribe_in(&listener, context);
        Subscription::new(self.clone(), listener, context)
    }

    /// Like [`EventHub::listen`], but the listener fires at most once.
    pub fn listen_once(&self, listener: Listener<T>) -> Subscription<T> {
        let context = self.default_context();
        self.subscribe_once_in(&listener, context);
        Subscription::new(self.clone(), listener, context)
    }
}

impl<T> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("listener", &self.listener.id())
            .field("context", &self.context)
            .finish()
    }
}
