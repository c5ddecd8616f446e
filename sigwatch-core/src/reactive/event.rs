//! Change events.

use super::node::Node;
use super::value::Value;

/// One observed write.
///
/// Built fresh for each dispatch and handed to listeners by reference.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchEvent {
    /// The node whose property changed. This is the nested node that was
    /// written to, not the root.
    pub target: Node,

    /// The property that was written.
    pub prop: String,

    /// The value now stored under `prop`.
    pub value: Value,
}

impl WatchEvent {
    pub fn new(target: Node, prop: impl Into<String>, value: Value) -> Self {
        Self {
            target,
            prop: prop.into(),
            value,
        }
    }
}
