//! Listener contexts.
//!
//! A context is the grouping key listeners are registered under. The hub
//! hands the key back to every listener it invokes, which lets a single
//! callback tell apart the objects it was attached to without capturing a
//! closure per object.
//!
//! Keys are opaque tokens minted from a process-wide counter. Two keys are
//! equal only if one was copied from the other.

use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identity key for a group of listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextKey(u64);

impl ContextKey {
    /// Mint a new key, distinct from every key minted before it.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw token value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for ContextKey {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ContextKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ctx#{}", self.0)
    }
}
