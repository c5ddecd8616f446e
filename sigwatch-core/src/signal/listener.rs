//! Listener handles for the event hub.
//!
//! A Listener wraps a callback together with a unique ID. The ID is what the
//! hub uses for identity: registering, checking and removing a listener all
//! compare IDs, never closure contents. Clones share the ID, so a clone kept
//! aside can later be used to unsubscribe the original registration.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::context::ContextKey;
use crate::error::BoxError;

/// Unique identifier for a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Generate a new unique listener ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ListenerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a single listener invocation.
pub type ListenerResult = Result<(), BoxError>;

/// Callback signature stored by the hub.
///
/// The first argument is the context the listener was registered under.
pub type ListenerFn<T> = dyn Fn(ContextKey, &T) -> ListenerResult + Send + Sync;

/// A callback accepting values of type `T`.
pub struct Listener<T> {
    id: ListenerId,
    callback: Arc<ListenerFn<T>>,
}

impl<T> Listener<T> {
    /// Create a listener from a callback that receives its context.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(ContextKey, &T) -> ListenerResult + Send + Sync + 'static,
    {
        Self {
            id: ListenerId::new(),
            callback: Arc::new(callback),
        }
    }

    /// Create a listener that ignores its context.
    pub fn from_fn<F>(callback: F) -> Self
    where
        T: 'static,
        F: Fn(&T) -> ListenerResult + Send + Sync + 'static,
    {
        Self::new(move |_, value| callback(value))
    }

    /// Get the listener's unique ID.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Invoke the callback.
    pub fn call(&self, context: ContextKey, value: &T) -> ListenerResult {
        (self.callback)(context, value)
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Listener<T> {}

impl<T> Hash for Listener<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicU64};

    #[test]
    fn listener_ids_are_unique() {
        let l1 = Listener::<i32>::from_fn(|_| Ok(()));
        let l2 = Listener::<i32>::from_fn(|_| Ok(()));

        assert_ne!(l1.id(), l2.id());
        assert_ne!(l1, l2);
    }

    #[test]
    fn clones_share_identity() {
        let listener = Listener::<i32>::from_fn(|_| Ok(()));
        let clone = listener.clone();

        assert_eq!(listener, clone);
        assert_eq!(listener.id(), clone.id());
    }

    #[test]
    fn call_passes_context_and_value() {
        let seen_context = Arc::new(AtomicU64::new(u64::MAX));
        let called = Arc::new(AtomicBool::new(false));
        let seen_clone = seen_context.clone();
        let called_clone = called.clone();

        let listener = Listener::new(move |ctx, value: &i32| {
            assert_eq!(*value, 7);
            seen_clone.store(ctx.raw(), Ordering::SeqCst);
            called_clone.store(true, Ordering::SeqCst);
            Ok(())
        });

        let ctx = ContextKey::new();
        listener.call(ctx, &7).unwrap();

        assert!(called.load(Ordering::SeqCst));
        assert_eq!(seen_context.load(Ordering::SeqCst), ctx.raw());
    }

    #[test]
    fn call_surfaces_callback_error() {
        let listener = Listener::<i32>::from_fn(|_| Err("boom".into()));
        let err = listener.call(ContextKey::new(), &1).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
