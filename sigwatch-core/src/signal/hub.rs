//! Event Hub Implementation
//!
//! The hub is a typed, multi-listener dispatcher. Listeners are grouped by
//! the context they were registered under, and every registration is either
//! durable (fires on each dispatch) or once (fires on the next dispatch that
//! reaches it, then disappears).
//!
//! # Registry Layout
//!
//! Each registry is an insertion-ordered map from context to an
//! insertion-ordered set of listeners:
//!
//! - Contexts are enumerated in the order they were first registered.
//! - Listeners within a context are enumerated in registration order.
//! - A context whose set becomes empty is removed immediately, so the
//!   registries never hold empty entries.
//!
//! # Dispatch
//!
//! Dispatch works on a snapshot taken at the start of the pass. Durable
//! listeners in the snapshot are all invoked, even if one of them is removed
//! mid-pass. Listeners added mid-pass wait for the next dispatch. Once
//! listeners are claimed (removed from the registry) right before they run;
//! a once listener that is already gone by the time the pass reaches it is
//! skipped, which keeps "at most once" intact under re-entrant dispatch.
//!
//! The registry lock is never held while a listener runs. Listeners may
//! subscribe, unsubscribe or dispatch again on the same hub.
//!
//! # Failure
//!
//! The first listener error aborts the pass and is returned to the caller
//! of `dispatch`. There is no isolation between listeners.

use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use parking_lot::Mutex;
use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use super::context::ContextKey;
use super::listener::Listener;
use crate::error::{Error, Result};

type Bucket<T> = IndexMap<ContextKey, IndexSet<Listener<T>>>;

/// Listeners collected for one dispatch pass.
type Snapshot<T> = SmallVec<[(ContextKey, Listener<T>); 8]>;

struct Registry<T> {
    durable: Bucket<T>,
    once: Bucket<T>,
}

impl<T> Registry<T> {
    fn new() -> Self {
        Self {
            durable: IndexMap::new(),
            once: IndexMap::new(),
        }
    }
}

/// A typed publish/subscribe hub.
///
/// Cloning a hub yields another handle onto the same registry.
///
/// # Example
///
/// ```rust
/// use sigwatch_core::signal::{EventHub, Listener};
///
/// let hub = EventHub::new();
/// let listener = Listener::from_fn(|value: &i32| {
///     println!("got {value}");
///     Ok(())
/// });
///
/// hub.subscribe(&listener);
/// hub.dispatch(&5).unwrap();
/// hub.unsubscribe(&listener);
/// assert!(hub.is_empty());
/// ```
pub struct EventHub<T> {
    /// Context used when a caller does not name one.
    default_context: ContextKey,

    registry: Arc<Mutex<Registry<T>>>,
}

impl<T> EventHub<T> {
    /// Create a new, empty hub.
    pub fn new() -> Self {
        Self {
            default_context: ContextKey::new(),
            registry: Arc::new(Mutex::new(Registry::new())),
        }
    }

    /// The context this hub registers listeners under by default.
    pub fn default_context(&self) -> ContextKey {
        self.default_context
    }

    /// Register a durable listener under the default context.
    pub fn subscribe(&self, listener: &Listener<T>) {
        self.subscribe_in(listener, self.default_context);
    }

    /// Register a durable listener under `context`.
    ///
    /// Registering the same (listener, context) pair again has no effect.
    pub fn subscribe_in(&self, listener: &Listener<T>, context: ContextKey) {
        let added = insert(&mut self.registry.lock().durable, listener, context);
        trace!(listener = listener.id().raw(), %context, added, "subscribe");
    }

    /// Register a once listener under the default context.
    pub fn subscribe_once(&self, listener: &Listener<T>) {
        self.subscribe_once_in(listener, self.default_context);
    }

    /// Register a listener under `context` that fires on the next dispatch
    /// only.
    pub fn subscribe_once_in(&self, listener: &Listener<T>, context: ContextKey) {
        let added = insert(&mut self.registry.lock().once, listener, context);
        trace!(listener = listener.id().raw(), %context, added, "subscribe_once");
    }

    /// Remove a listener registered under the default context.
    pub fn unsubscribe(&self, listener: &Listener<T>) {
        self.unsubscribe_in(listener, self.default_context);
    }

    /// Remove `listener` from both the durable and once registries under
    /// `context`. Does nothing if the pair was never registered.
    pub fn unsubscribe_in(&self, listener: &Listener<T>, context: ContextKey) {
        let mut registry = self.registry.lock();
        let durable = remove(&mut registry.durable, listener, context);
        let once = remove(&mut registry.once, listener, context);
        trace!(listener = listener.id().raw(), %context, durable, once, "unsubscribe");
    }

    /// Remove every listener under every context.
    pub fn unsubscribe_all(&self) {
        let mut registry = self.registry.lock();
        registry.durable.clear();
        registry.once.clear();
        trace!(hub = %self.default_context, "unsubscribe_all");
    }

    /// Deliver `value` to every registered listener.
    ///
    /// Durable listeners run first, then once listeners. Returns the first
    /// listener error, in which case the rest of the pass is skipped.
    pub fn dispatch(&self, value: &T) -> Result<()> {
        let (durable, once) = {
            let registry = self.registry.lock();
            (snapshot(&registry.durable), snapshot(&registry.once))
        };

        debug!(
            hub = %self.default_context,
            durable = durable.len(),
            once = once.len(),
            "dispatch"
        );

        for (context, listener) in &durable {
            invoke(*context, listener, value)?;
        }

        for (context, listener) in &once {
            let claimed = remove(&mut self.registry.lock().once, listener, *context);
            if !claimed {
                continue;
            }
            invoke(*context, listener, value)?;
        }

        Ok(())
    }

    /// True if no context holds any listener.
    pub fn is_empty(&self) -> bool {
        let registry = self.registry.lock();
        registry.durable.is_empty() && registry.once.is_empty()
    }

    /// Total number of registrations across both registries.
    pub fn listener_count(&self) -> usize {
        let registry = self.registry.lock();
        count(&registry.durable) + count(&registry.once)
    }

    /// Number of context entries across both registries.
    pub fn context_count(&self) -> usize {
        let registry = self.registry.lock();
        registry.durable.len() + registry.once.len()
    }

    /// Whether `listener` is registered under `context`, durable or once.
    pub fn contains(&self, listener: &Listener<T>, context: ContextKey) -> bool {
        let registry = self.registry.lock();
        holds(&registry.durable, listener, context) || holds(&registry.once, listener, context)
    }
}

fn insert<T>(bucket: &mut Bucket<T>, listener: &Listener<T>, context: ContextKey) -> bool {
    bucket.entry(context).or_default().insert(listener.clone())
}

fn holds<T>(bucket: &Bucket<T>, listener: &Listener<T>, context: ContextKey) -> bool {
    bucket.get(&context).is_some_and(|set| set.contains(listener))
}

fn remove<T>(bucket: &mut Bucket<T>, listener: &Listener<T>, context: ContextKey) -> bool {
    let Some(set) = bucket.get_mut(&context) else {
        return false;
    };
    let removed = set.shift_remove(listener);
    if set.is_empty() {
        bucket.shift_remove(&context);
    }
    removed
}

fn snapshot<T>(bucket: &Bucket<T>) -> Snapshot<T> {
    bucket
        .iter()
        .flat_map(|(context, set)| set.iter().map(move |listener| (*context, listener.clone())))
        .collect()
}

fn count<T>(bucket: &Bucket<T>) -> usize {
    bucket.values().map(IndexSet::len).sum()
}

fn invoke<T>(context: ContextKey, listener: &Listener<T>, value: &T) -> Result<()> {
    listener.call(context, value).map_err(|err| {
        warn!(listener = listener.id().raw(), %context, error = %err, "listener failed");
        Error::Listener(err)
    })
}

impl<T> Clone for EventHub<T> {
    fn clone(&self) -> Self {
        Self {
            default_context: self.default_context,
            registry: Arc::clone(&self.registry),
        }
    }
}

impl<T> Default for EventHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventHub<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHub")
            .field("default_context", &self.default_context)
            .field("listener_count", &self.listener_count())
            .field("context_count", &self.context_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
