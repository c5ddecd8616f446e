//! Dynamic structured values.
//!
//! Scalars are held inline and compare by value. Objects and lists live in a
//! shared [`Node`] and compare by identity: two values holding different
//! nodes are unequal even if the nodes have the same contents. That is the
//! equality the wrapper uses to decide whether a write changed anything.

use serde_json::Number;

use super::node::{Node, NodeData};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// A record or list, shared by reference.
    Object(Node),
}

impl Value {
    /// Whether the value is a record or list.
    pub fn is_structured(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Value::Object(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Build a number from a float, failing on NaN and infinities instead of
    /// storing `Null` the way `Value::from` does.
    pub fn from_finite(f: f64) -> Result<Self> {
        Number::from_f64(f)
            .map(Value::Number)
            .ok_or(Error::NonFinite { value: f })
    }

    /// Build a value from JSON. Every object and array becomes a new node.
    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Object(Node::from_items(items.into_iter().map(Value::from_json)))
            }
            serde_json::Value::Object(fields) => Value::Object(Node::from_fields(
                fields.into_iter().map(|(k, v)| (k, Value::from_json(v))),
            )),
        }
    }

    /// Deep copy into JSON.
    ///
    /// Nodes reachable along more than one path are copied once per path.
    /// A node that contains itself fails with [`Error::Cyclic`].
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let mut ancestors = Vec::new();
        to_json_inner(self, &mut ancestors)
    }
}

fn to_json_inner(value: &Value, ancestors: &mut Vec<Node>) -> Result<serde_json::Value> {
    let node = match value {
        Value::Null => return Ok(serde_json::Value::Null),
        Value::Bool(b) => return Ok(serde_json::Value::Bool(*b)),
        Value::Number(n) => return Ok(serde_json::Value::Number(n.clone())),
        Value::String(s) => return Ok(serde_json::Value::String(s.clone())),
        Value::Object(node) => node,
    };

    if ancestors.iter().any(|a| a.ptr_eq(node)) {
        return Err(Error::Cyclic);
    }

    // Copy out under the lock, then recurse without holding it.
    let data = node.data();
    ancestors.push(node.clone());
    let json = match data {
        NodeData::Record(fields) => {
            let mut map = serde_json::Map::with_capacity(fields.len());
            for (k, v) in &fields {
                map.insert(k.clone(), to_json_inner(v, ancestors)?);
            }
            serde_json::Value::Object(map)
        }
        NodeData::List(items) => serde_json::Value::Array(
            items
                .iter()
                .map(|v| to_json_inner(v, ancestors))
                .collect::<Result<_>>()?,
        ),
    };
    ancestors.pop();
    Ok(json)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => number_eq(a, b),
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

/// Numbers compare by numeric value, so `1` and `1.0` are the same.
fn number_eq(a: &Number, b: &Number) -> bool {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return x == y;
    }
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Number(Number::from(n))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become `Null`. See
    /// [`Value::from_finite`] for the checked form.
    fn from(f: f64) -> Self {
        Number::from_f64(f).map_or(Value::Null, Value::Number)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::from(f64::from(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        Value::Object(node)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}
