//! Sigwatch Core
//!
//! This crate provides two coupled primitives:
//!
//! - A typed publish/subscribe hub with durable and one-shot listeners
//!   grouped by context
//! - A change-notifying wrapper over structured values, built on the hub
//!
//! # Architecture
//!
//! The crate is organized into two modules:
//!
//! - `signal`: listener registry and synchronous dispatch
//! - `reactive`: dynamic values, shared nodes and the wrapper that turns
//!   writes into events
//!
//! # Example
//!
//! ```rust
//! use sigwatch_core::reactive::{Reactive, Value};
//! use serde_json::json;
//!
//! let state = Reactive::from_json(json!({"count": 0})).unwrap();
//!
//! let sub = state.watch(|event| {
//!     println!("{} changed to {:?}", event.prop, event.value);
//!     Ok(())
//! });
//!
//! state.set("count", 1).unwrap();
//! // Listener runs before `set` returns
//!
//! state.set("count", 1).unwrap();
//! // Same value, nothing dispatched
//!
//! sub.unsubscribe();
//! assert_eq!(state.get("count").unwrap().scalar(), Some(&Value::from(1)));
//! ```

pub mod error;
pub mod reactive;
pub mod signal;

pub use error::{BoxError, Error, Result};
