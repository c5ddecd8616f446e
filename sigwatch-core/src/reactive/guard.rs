//! Forbidden property names.
//!
//! These names reach the prototype machinery of the host object model. They
//! are rejected on both read and write, before any state is touched.

use tracing::debug;

use crate::error::{Error, Result};

/// Property names no wrapper will read or write.
pub const FORBIDDEN_PROPS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Whether `prop` is one of [`FORBIDDEN_PROPS`].
pub fn is_forbidden(prop: &str) -> bool {
    FORBIDDEN_PROPS.contains(&prop)
}

pub(crate) fn check(prop: &str) -> Result<()> {
    if is_forbidden(prop) {
        debug!(prop, "blocked forbidden property access");
        return Err(Error::ForbiddenAccess {
            prop: prop.to_owned(),
        });
    }
    Ok(())
}
