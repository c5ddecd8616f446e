//! Reactive Wrapper Implementation
//!
//! A [`Reactive`] is a view over a [`Node`] that turns property writes into
//! [`WatchEvent`]s on an [`EventHub`].
//!
//! # How Wrapping Works
//!
//! 1. The root wrapper owns one hub. Every wrapper derived from it shares
//!    that hub, so a listener watching any of them sees writes anywhere in
//!    the tree.
//!
//! 2. Reading a property that holds a node returns a brand new wrapper over
//!    that node. Nothing is cached: two reads give two wrappers with
//!    different IDs over the same node and the same hub.
//!
//! 3. Writing a property stores the value on the node first, then
//!    dispatches an event if the new value differs from the old one by
//!    identity. A failing listener cannot undo the write.
//!
//! 4. The names in [`FORBIDDEN_PROPS`](super::guard::FORBIDDEN_PROPS) fail
//!    both reads and writes with [`Error::ForbiddenAccess`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::trace;

use super::event::WatchEvent;
use super::guard;
use super::node::Node;
use super::value::Value;
use crate::error::{Error, Result};
use crate::signal::{EventHub, Listener, ListenerResult, Subscription};

/// Unique identifier for one wrapper instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WrapperId(u64);

impl WrapperId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Result of reading a property through a wrapper.
#[derive(Debug, Clone)]
pub enum Property {
    /// The property is not present.
    Absent,

    /// A non-structured value.
    Scalar(Value),

    /// A fresh wrapper over a nested record or list.
    Nested(Reactive),
}

impl Property {
    pub fn is_absent(&self) -> bool {
        matches!(self, Property::Absent)
    }

    pub fn scalar(&self) -> Option<&Value> {
        match self {
            Property::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn nested(&self) -> Option<&Reactive> {
        match self {
            Property::Nested(wrapper) => Some(wrapper),
            _ => None,
        }
    }

    pub fn into_nested(self) -> Option<Reactive> {
        match self {
            Property::Nested(wrapper) => Some(wrapper),
            _ => None,
        }
    }

    /// The underlying value, unwrapping nested wrappers to their node.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Property::Absent => None,
            Property::Scalar(value) => Some(value),
            Property::Nested(wrapper) => Some(Value::Object(wrapper.node)),
        }
    }
}

/// A change-notifying view over a structured value.
///
/// # Example
///
/// ```rust
/// use sigwatch_core::reactive::Reactive;
/// use serde_json::json;
///
/// let state = Reactive::from_json(json!({"user": {"name": "ada"}})).unwrap();
///
/// let sub = state.watch(|event| {
///     println!("{} = {:?}", event.prop, event.value);
///     Ok(())
/// });
///
/// let user = state.get("user").unwrap().into_nested().unwrap();
/// user.set("name", "grace").unwrap();
///
/// sub.unsubscribe();
/// ```
pub struct Reactive {
    id: WrapperId,
    node: Node,
    hub: EventHub<WatchEvent>,
}

impl Reactive {
    /// Wrap `node` with a new hub.
    pub fn new(node: Node) -> Self {
        Self::attach(node, EventHub::new())
    }

    /// Wrap `node`, dispatching through an existing hub.
    fn attach(node: Node, hub: EventHub<WatchEvent>) -> Self {
        Self {
            id: WrapperId::next(),
            node,
            hub,
        }
    }

    /// Wrap a structured value. Scalars fail with [`Error::NotStructured`].
    pub fn wrap(value: Value) -> Result<Self> {
        match value {
            Value::Object(node) => Ok(Self::new(node)),
            _ => Err(Error::NotStructured),
        }
    }

    /// Wrap a JSON object or array.
    pub fn from_json(json: serde_json::Value) -> Result<Self> {
        Self::wrap(Value::from_json(json))
    }

    /// Wrap anything that serializes to a JSON object or array.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        Self::from_json(serde_json::to_value(value)?)
    }

    /// This wrapper's ID. Every read of a nested property yields a new one.
    pub fn id(&self) -> WrapperId {
        self.id
    }

    /// The node this wrapper views.
    pub fn target(&self) -> &Node {
        &self.node
    }

    /// The hub shared by the whole tree.
    pub fn hub(&self) -> &EventHub<WatchEvent> {
        &self.hub
    }

    pub fn is_list(&self) -> bool {
        self.node.is_list()
    }

    pub fn len(&self) -> usize {
        self.node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        self.node.keys()
    }

    /// Read a property.
    pub fn get(&self, prop: &str) -> Result<Property> {
        guard::check(prop)?;
        Ok(match self.node.get(prop) {
            None => Property::Absent,
            Some(Value::Object(node)) => Property::Nested(Self::attach(node, self.hub.clone())),
            Some(value) => Property::Scalar(value),
        })
    }

    /// Read a property several levels down.
    ///
    /// Returns `Absent` as soon as a step is missing and fails with
    /// [`Error::NotStructured`] if a step lands on a scalar. An empty path
    /// yields a fresh wrapper over this node.
    pub fn get_path(&self, path: &[&str]) -> Result<Property> {
        let Some((last, parents)) = path.split_last() else {
            return Ok(Property::Nested(Self::attach(self.node.clone(), self.hub.clone())));
        };

        let mut current: Option<Reactive> = None;
        for prop in parents {
            let step = current.as_ref().unwrap_or(self).get(prop)?;
            current = match step {
                Property::Nested(next) => Some(next),
                Property::Absent => return Ok(Property::Absent),
                Property::Scalar(_) => return Err(Error::NotStructured),
            };
        }
        current.as_ref().unwrap_or(self).get(last)
    }

    /// Write a property and notify watchers if the value changed.
    ///
    /// The write is applied before any listener runs. A listener error is
    /// returned, but the new value stays in place.
    ///
    /// On a list, writing `length` truncates or pads the list and notifies
    /// like any other change. Floats go through `Value::from`, which stores
    /// NaN and infinities as `Null`; use [`Value::from_finite`] to reject
    /// them instead.
    pub fn set(&self, prop: &str, value: impl Into<Value>) -> Result<()> {
        guard::check(prop)?;
        let value = value.into();
        let old = self.node.replace(prop, value.clone())?;

        if old.as_ref() == Some(&value) {
            trace!(node = self.node.id().raw(), prop, "unchanged write");
            return Ok(());
        }

        self.hub.dispatch(&WatchEvent::new(self.node.clone(), prop, value))
    }

    /// Call `callback` for every change anywhere in the tree.
    pub fn watch<F>(&self, callback: F) -> Subscription<WatchEvent>
    where
        F: Fn(&WatchEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.hub.listen(Listener::from_fn(callback))
    }

    /// Call `callback` for the next change only.
    pub fn watch_once<F>(&self, callback: F) -> Subscription<WatchEvent>
    where
        F: Fn(&WatchEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.hub.listen_once(Listener::from_fn(callback))
    }

    /// Deep copy of the current contents as JSON.
    pub fn snapshot(&self) -> Result<serde_json::Value> {
        Value::Object(self.node.clone()).to_json()
    }

    /// Deserialize the current contents into `T`.
    pub fn to_typed<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.snapshot()?)?)
    }
}

impl Clone for Reactive {
    /// A clone is the same wrapper: same ID, same node, same hub.
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            node: self.node.clone(),
            hub: self.hub.clone(),
        }
    }
}

impl From<Reactive> for Value {
    fn from(wrapper: Reactive) -> Self {
        Value::Object(wrapper.node)
    }
}

impl From<&Reactive> for Value {
    fn from(wrapper: &Reactive) -> Self {
        Value::Object(wrapper.node.clone())
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reactive")
            .field("id", &self.id)
            .field("node", &self.node)
            .field("hub", &self.hub.default_context())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::LENGTH_PROP;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Arc;

    fn recorder(wrapper: &Reactive) -> (Arc<Mutex<Vec<WatchEvent>>>, Subscription<WatchEvent>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        let sub = wrapper.watch(move |event| {
            events_clone.lock().push(event.clone());
            Ok(())
        });
        (events, sub)
    }

    #[test]
    fn wrap_rejects_scalars() {
        assert!(matches!(Reactive::wrap(Value::from(1)), Err(Error::NotStructured)));
        assert!(matches!(Reactive::from_json(json!("text")), Err(Error::NotStructured)));
        assert!(Reactive::from_json(json!([1, 2])).unwrap().is_list());
    }

    #[test]
    fn get_returns_scalars_and_absent() {
        let state = Reactive::from_json(json!({"n": 1, "s": "x", "z": null})).unwrap();

        assert_eq!(state.get("n").unwrap().scalar(), Some(&Value::from(1)));
        assert_eq!(state.get("s").unwrap().scalar(), Some(&Value::from("x")));
        assert_eq!(state.get("z").unwrap().scalar(), Some(&Value::Null));
        assert!(state.get("missing").unwrap().is_absent());
    }

    #[test]
    fn nested_reads_are_fresh_wrappers() {
        let state = Reactive::from_json(json!({"a": {"b": 1}})).unwrap();

        let first = state.get("a").unwrap().into_nested().unwrap();
        let second = state.get("a").unwrap().into_nested().unwrap();

        assert_ne!(first.id(), second.id());
        assert_eq!(first.target(), second.target());
        assert_eq!(first.hub().default_context(), state.hub().default_context());
    }

    #[test]
    fn nested_write_dispatches_through_root_hub() {
        let state = Reactive::from_json(json!({"a": {"b": 1}})).unwrap();
        let (events, _sub) = recorder(&state);

        let a = state.get("a").unwrap().into_nested().unwrap();
        a.set("b", 2).unwrap();

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].prop, "b");
        assert_eq!(events[0].value, Value::from(2));
        assert_eq!(&events[0].target, a.target());
        assert_ne!(&events[0].target, state.target());
    }

    #[test]
    fn unchanged_write_is_silent() {
        let state = Reactive::from_json(json!({"n": 1})).unwrap();
        let (events, _sub) = recorder(&state);

        state.set("n", 1).unwrap();
        assert!(events.lock().is_empty());

        state.set("n", 2).unwrap();
        state.set("n", 2).unwrap();
        assert_eq!(events.lock().len(), 1);
    }

    #[test]
    fn new_property_dispatches_even_for_null() {
        let state = Reactive::from_json(json!({})).unwrap();
        let (events, _sub) = recorder(&state);

        state.set("fresh", Value::Null).unwrap();
        assert_eq!(events.lock().len(), 1);
    }

    #[test]
    fn equal_but_distinct_objects_dispatch() {
        let state = Reactive::from_json(json!({"a": {"x": 1}})).unwrap();
        let (events, _sub) = recorder(&state);

        state.set("a", Node::from_fields([("x", 1)])).unwrap();
        assert_eq!(events.lock().len(), 1);
    }

    #[test]
    fn assigning_a_wrapper_stores_its_node() {
        let state = Reactive::from_json(json!({"a": {"x": 1}})).unwrap();
        let (events, _sub) = recorder(&state);

        // Writing back what was read is a no-op
        let a = state.get("a").unwrap().into_nested().unwrap();
        state.set("a", &a).unwrap();
        assert!(events.lock().is_empty());

        state.set("copy", a.clone()).unwrap();
        let copy = state.get("copy").unwrap().into_nested().unwrap();
        assert_eq!(copy.target(), a.target());
    }

    #[test]
    fn forbidden_props_fail_without_effect() {
        let state = Reactive::from_json(json!({"a": {"b": 1}})).unwrap();
        let (events, _sub) = recorder(&state);
        let before = state.snapshot().unwrap();

        for prop in guard::FORBIDDEN_PROPS {
            assert!(state.get(prop).unwrap_err().is_forbidden());
            assert!(state.set(prop, 1).unwrap_err().is_forbidden());
        }

        assert_eq!(state.snapshot().unwrap(), before);
        assert!(events.lock().is_empty());
    }

    #[test]
    fn listener_error_keeps_the_write() {
        let state = Reactive::from_json(json!({"n": 1})).unwrap();
        let _sub = state.watch(|_| Err("rejected".into()));

        let err = state.set("n", 5).unwrap_err();
        assert!(matches!(err, Error::Listener(_)));
        assert_eq!(state.get("n").unwrap().scalar(), Some(&Value::from(5)));
    }

    #[test]
    fn watch_once_fires_for_next_change_only() {
        let state = Reactive::from_json(json!({"n": 0})).unwrap();
        let count = Arc::new(Mutex::new(0));
        let count_clone = count.clone();
        let sub = state.watch_once(move |_| {
            *count_clone.lock() += 1;
            Ok(())
        });

        state.set("n", 1).unwrap();
        state.set("n", 2).unwrap();

        assert_eq!(*count.lock(), 1);
        assert!(!sub.is_active());
    }

    #[test]
    fn watching_a_nested_wrapper_sees_root_writes() {
        let state = Reactive::from_json(json!({"a": {}, "n": 0})).unwrap();
        let a = state.get("a").unwrap().into_nested().unwrap();
        let (events, sub) = recorder(&a);

        state.set("n", 1).unwrap();
        assert_eq!(events.lock().len(), 1);

        sub.unsubscribe();
        state.set("n", 2).unwrap();
        assert_eq!(events.lock().len(), 1);
        assert!(state.hub().is_empty());
    }

    #[test]
    fn list_writes_dispatch() {
        let state = Reactive::from_json(json!({"items": [1, 2]})).unwrap();
        let (events, _sub) = recorder(&state);
        let items = state.get("items").unwrap().into_nested().unwrap();

        items.set("0", 10).unwrap();
        items.set("2", 3).unwrap();
        assert!(matches!(items.set("name", 1), Err(Error::InvalidKey { .. })));

        let props: Vec<_> = events.lock().iter().map(|e| e.prop.clone()).collect();
        assert_eq!(props, vec!["0", "2"]);
        assert_eq!(state.snapshot().unwrap(), json!({"items": [10, 2, 3]}));
        assert_eq!(items.get("length").unwrap().scalar(), Some(&Value::from(3)));
    }

    #[test]
    fn list_length_write_notifies() {
        let state = Reactive::from_json(json!([1, 2, 3])).unwrap();
        let (events, _sub) = recorder(&state);

        state.set(LENGTH_PROP, 1).unwrap();
        state.set(LENGTH_PROP, 1).unwrap();
        state.set(LENGTH_PROP, 2).unwrap();

        let events = events.lock();
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.prop == LENGTH_PROP));
        assert_eq!(events[1].value, Value::from(2));
        assert_eq!(state.snapshot().unwrap(), json!([1, null]));
    }

    #[test]
    fn oversized_list_writes_fail_without_notifying() {
        let state = Reactive::from_json(json!([1, 2])).unwrap();
        let (events, _sub) = recorder(&state);

        let err = state.set("18446744073709551615", 3).unwrap_err();
        assert!(matches!(err, Error::InvalidKey { .. }));
        let err = state.set(LENGTH_PROP, u64::MAX).unwrap_err();
        assert!(matches!(err, Error::InvalidKey { .. }));

        assert!(events.lock().is_empty());
        assert_eq!(state.snapshot().unwrap(), json!([1, 2]));
    }

    #[test]
    fn non_finite_float_writes() {
        let state = Reactive::from_json(json!({})).unwrap();

        state.set("x", f64::NAN).unwrap();
        assert_eq!(state.get("x").unwrap().scalar(), Some(&Value::Null));

        let err = Value::from_finite(f64::NAN)
            .and_then(|v| state.set("y", v))
            .unwrap_err();
        assert!(matches!(err, Error::NonFinite { .. }));
        assert!(state.get("y").unwrap().is_absent());
    }

    #[test]
    fn get_path_walks_nested_nodes() {
        let state = Reactive::from_json(json!({"a": {"b": {"c": 7}}, "n": 1})).unwrap();

        let c = state.get_path(&["a", "b", "c"]).unwrap();
        assert_eq!(c.scalar(), Some(&Value::from(7)));

        assert!(state.get_path(&["a", "missing", "c"]).unwrap().is_absent());
        assert!(matches!(state.get_path(&["n", "x"]), Err(Error::NotStructured)));
        assert!(state.get_path(&["a", "__proto__"]).unwrap_err().is_forbidden());

        let root = state.get_path(&[]).unwrap().into_nested().unwrap();
        assert_eq!(root.target(), state.target());
        assert_ne!(root.id(), state.id());
    }

    #[test]
    fn typed_round_trip() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Settings {
            theme: String,
            volume: u8,
        }

        let state = Reactive::from_serialize(&Settings {
            theme: "dark".into(),
            volume: 3,
        })
        .unwrap();
        state.set("volume", 9).unwrap();

        let settings: Settings = state.to_typed().unwrap();
        assert_eq!(
            settings,
            Settings {
                theme: "dark".into(),
                volume: 9
            }
        );
    }
}
