//! Event Hub
//!
//! This module implements the signal primitive: a typed hub that delivers
//! values to registered listeners.
//!
//! # Concepts
//!
//! ## Listeners
//!
//! A [`Listener`] is a callback with an identity. The hub compares listeners
//! by that identity, so registering a clone is the same as registering the
//! original.
//!
//! ## Contexts
//!
//! Every registration is filed under a [`ContextKey`]. The key is passed back
//! to the listener on each call, and removal must name both the listener and
//! the context. Each hub mints its own default context for callers that do
//! not care.
//!
//! ## Durable and Once
//!
//! Durable registrations fire on every dispatch. Once registrations fire on
//! the next dispatch that reaches them and are then removed.
//!
//! # Threading
//!
//! Delivery is synchronous: `dispatch` runs every listener inline before it
//! returns. The registry sits behind a lock so hubs can be shared between
//! threads, but nothing is ever delivered on another thread.

mod context;
mod hub;
mod listener;
mod subscription;

pub use context::ContextKey;
pub use hub::EventHub;
pub use listener::{Listener, ListenerFn, ListenerId, ListenerResult};
pub use subscription::Subscription;
