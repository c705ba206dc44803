//! Built-in resource kinds
//!
//! Each submodule declares one resource kind: its schema, path derivation and
//! identifier strategy. [`builtin_registry`] aggregates them into a registry
//! ready to hand to the lifecycle driver.

pub mod entity_alias;
pub mod managed_keys;

use crate::schema::registry::Registry;

/// Construct a registry holding every built-in resource kind.
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(managed_keys::kind());
    registry.register(entity_alias::kind());
    registry
}
