//! Shared object nodes.
//!
//! A Node is one structured value with identity: a record of named fields or
//! a list of items. Cloning a node clones the handle, not the data, so every
//! clone observes and mutates the same storage. Two nodes are equal only if
//! they are handles onto the same storage.
//!
//! Writes through a node directly are not observed by anyone; observation
//! happens one layer up, in the wrapper.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::value::Value;
use crate::error::{Error, Result};

/// Property name that reports a list's item count.
pub const LENGTH_PROP: &str = "length";

/// Largest length a list may be given, by index write or `length` write.
pub const MAX_LIST_LEN: usize = u32::MAX as usize;

/// Unique identifier for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

impl NodeId {
    /// Generate a new unique node ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Storage behind a node.
#[derive(Debug, Clone)]
pub enum NodeData {
    /// Named fields, kept in insertion order.
    Record(IndexMap<String, Value>),

    /// Items addressed by decimal index.
    List(Vec<Value>),
}

/// Handle to a shared structured value.
#[derive(Clone)]
pub struct Node {
    id: NodeId,
    data: Arc<RwLock<NodeData>>,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            id: NodeId::new(),
            data: Arc::new(RwLock::new(data)),
        }
    }

    /// Create an empty record.
    pub fn record() -> Self {
        Self::with_data(NodeData::Record(IndexMap::new()))
    }

    /// Create an empty list.
    pub fn list() -> Self {
        Self::with_data(NodeData::List(Vec::new()))
    }

    /// Create a record from `(name, value)` pairs.
    pub fn from_fields<K, V, I>(fields: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::with_data(NodeData::Record(fields))
    }

    /// Create a list from items.
    pub fn from_items<V, I>(items: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Self::with_data(NodeData::List(items.into_iter().map(Into::into).collect()))
    }

    /// Get the node's ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Whether two handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Whether this node is a list.
    pub fn is_list(&self) -> bool {
        matches!(*self.data.read(), NodeData::List(_))
    }

    /// Number of fields or items.
    pub fn len(&self) -> usize {
        match &*self.data.read() {
            NodeData::Record(fields) => fields.len(),
            NodeData::List(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Property names, in order. Lists report their indices.
    pub fn keys(&self) -> Vec<String> {
        match &*self.data.read() {
            NodeData::Record(fields) => fields.keys().cloned().collect(),
            NodeData::List(items) => (0..items.len()).map(|i| i.to_string()).collect(),
        }
    }

    /// Copy of the current storage. Nested nodes are shared, not copied.
    pub fn data(&self) -> NodeData {
        self.data.read().clone()
    }

    /// Read a property. Returns `None` if it is not present.
    pub fn get(&self, prop: &str) -> Option<Value> {
        match &*self.data.read() {
            NodeData::Record(fields) => fields.get(prop).cloned(),
            NodeData::List(items) if prop == LENGTH_PROP => Some(Value::from(items.len())),
            NodeData::List(items) => parse_index(prop).and_then(|i| items.get(i).cloned()),
        }
    }

    /// Store a property without notifying anyone, returning the previous
    /// value if there was one.
    ///
    /// On a list, writing past the end pads with `Null`, and writing
    /// `length` truncates or pads to the given size. Neither may take the
    /// list past [`MAX_LIST_LEN`].
    pub fn replace(&self, prop: &str, value: Value) -> Result<Option<Value>> {
        let mut data = self.data.write();
        match &mut *data {
            NodeData::Record(fields) => Ok(fields.insert(prop.to_owned(), value)),
            NodeData::List(items) if prop == LENGTH_PROP => {
                let len = value
                    .as_u64()
                    .and_then(|n| usize::try_from(n).ok())
                    .filter(|&n| n <= MAX_LIST_LEN)
                    .ok_or_else(|| Error::InvalidKey {
                        prop: prop.to_owned(),
                    })?;
                let old = items.len();
                resize(items, len)?;
                Ok(Some(Value::from(old)))
            }
            NodeData::List(items) => {
                let index = parse_index(prop).ok_or_else(|| Error::InvalidKey {
                    prop: prop.to_owned(),
                })?;
                if index < items.len() {
                    return Ok(Some(std::mem::replace(&mut items[index], value)));
                }
                resize(items, index + 1)?;
                items[index] = value;
                Ok(None)
            }
        }
    }

    /// Remove a record field. Lists are left untouched.
    pub fn remove(&self, prop: &str) -> Option<Value> {
        match &mut *self.data.write() {
            NodeData::Record(fields) => fields.shift_remove(prop),
            NodeData::List(_) => None,
        }
    }
}

/// Parse a canonical decimal index ("0", "17"; not "+1" or "01") below
/// [`MAX_LIST_LEN`].
fn parse_index(prop: &str) -> Option<usize> {
    let canonical = prop == "0" || (!prop.starts_with('0') && prop.bytes().all(|b| b.is_ascii_digit()));
    if !canonical {
        return None;
    }
    prop.parse().ok().filter(|&i| i < MAX_LIST_LEN)
}

/// Truncate or pad with `Null`, failing instead of aborting if the
/// allocation cannot be made.
fn resize(items: &mut Vec<Value>, len: usize) -> Result<()> {
    if let Some(extra) = len.checked_sub(items.len()) {
        items
            .try_reserve_exact(extra)
            .map_err(|_| Error::Capacity { len })?;
    }
    items.resize(len, Value::Null);
    Ok(())
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Node {}

impl fmt::Debug for Node {
    // Nodes may form cycles, so contents are never printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("list", &self.is_list())
            .field("len", &self.len())
            .finish()
    }
}
