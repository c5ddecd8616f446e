//! Reactive Wrapper
//!
//! This module turns a plain structured value into one that reports its own
//! mutations. It is built entirely on the event hub in [`crate::signal`]:
//! every observed write becomes one dispatch.
//!
//! # Concepts
//!
//! ## Values and Nodes
//!
//! Data is held as a tree of [`Value`]s. Records and lists live in shared
//! [`Node`]s, which have identity. Writing a node into two places shares it,
//! just like assigning an object reference twice.
//!
//! ## Wrappers
//!
//! A [`Reactive`] is a view over one node plus the hub for its whole tree.
//! Reads go through `get`, writes through `set`. There is no transparent
//! field syntax; these accessors are the interception points.
//!
//! ## Events
//!
//! A write that changes a property emits a [`WatchEvent`] naming the node
//! written to, the property, and the new value. Change means identity
//! inequality: scalars by value, nodes by reference. No deep comparison is
//! done.
//!
//! # Limits
//!
//! Only writes made through a wrapper are observed. Mutating a node
//! directly, or removing fields, emits nothing.

mod event;
mod guard;
mod node;
mod value;
mod wrapper;

pub use event::WatchEvent;
pub use guard::{is_forbidden, FORBIDDEN_PROPS};
pub use node::{Node, NodeData, NodeId, LENGTH_PROP, MAX_LIST_LEN};
pub use value::Value;
pub use wrapper::{Property, Reactive, WrapperId};
