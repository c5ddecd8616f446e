//! Error types.

use thiserror::Error;

/// Boxed error returned by listener callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A read or write touched a property that must never be reachable
    /// through a wrapper.
    #[error("access to forbidden property `{prop}`")]
    ForbiddenAccess { prop: String },

    /// A listener failed during dispatch. Listeners after it in the same
    /// pass were not invoked.
    #[error("listener failed: {0}")]
    Listener(#[source] BoxError),

    #[error("value is not an object or list")]
    NotStructured,

    /// A list key was not a canonical index, or a list index or `length`
    /// write would exceed the list size limit.
    #[error("`{prop}` is not a valid list index or length")]
    InvalidKey { prop: String },

    /// Growing a list to `len` items could not be allocated.
    #[error("cannot grow list to {len} items")]
    Capacity { len: usize },

    #[error("{value} has no numeric JSON form")]
    NonFinite { value: f64 },

    #[error("value contains a reference cycle")]
    Cyclic,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this is a forbidden-surface violation.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Error::ForbiddenAccess { .. })
    }
}
