//! Resource kind registry
//!
//! Maps resource kind keys to their schemas, path derivation and identifier
//! strategy. The registry is an explicit object built once at startup and
//! passed by reference into the lifecycle driver; there is no ambient global
//! state, so distinct registries can coexist (useful in tests).

use crate::error::{MapperError, Result};
use crate::record::FieldMap;
use crate::schema::ResourceSchema;
use std::collections::HashMap;

/// How a resource instance obtains its durable identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdStrategy {
    /// The computed remote path doubles as the identifier.
    RemotePath,
    /// The identifier is issued by the server in the create response.
    ServerField {
        /// Field of the create response holding the identifier.
        field: &'static str,
        /// Path prefix under which the object is addressed thereafter.
        path_prefix: &'static str,
    },
}

/// Derives the canonical remote path for a record's identifying fields.
pub type PathFn = fn(&FieldMap) -> Result<String>;

/// One registered resource kind: schema plus addressing rules.
#[derive(Debug, Clone)]
pub struct ResourceKind {
    key: &'static str,
    schema: ResourceSchema,
    id_strategy: IdStrategy,
    path_fn: PathFn,
}

impl ResourceKind {
    pub fn new(
        key: &'static str,
        schema: ResourceSchema,
        id_strategy: IdStrategy,
        path_fn: PathFn,
    ) -> Self {
        ResourceKind {
            key,
            schema,
            id_strategy,
            path_fn,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    pub fn id_strategy(&self) -> IdStrategy {
        self.id_strategy
    }

    /// Compute the remote path targeted at create time.
    ///
    /// Fails with `InvalidConfiguration` when a required key field is absent.
    pub fn remote_path(&self, fields: &FieldMap) -> Result<String> {
        (self.path_fn)(fields)
    }

    /// Resolve an identifier to the path used for read/update/delete.
    ///
    /// For path-identified kinds the identifier already is the path. For
    /// server-identified kinds a bare identifier is prefixed; a full path
    /// (as supplied to Import) passes through untouched.
    pub fn read_path(&self, id: &str) -> String {
        match self.id_strategy {
            IdStrategy::RemotePath => id.to_string(),
            IdStrategy::ServerField { path_prefix, .. } => {
                if id.contains('/') {
                    id.to_string()
                } else {
                    format!("{path_prefix}/{id}")
                }
            }
        }
    }
}

/// Registry of resource kinds, keyed by kind.
#[derive(Debug, Default)]
pub struct Registry {
    kinds: HashMap<&'static str, ResourceKind>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kind. Registering the same key twice is a programmer error.
    pub fn register(&mut self, kind: ResourceKind) {
        let key = kind.key;
        if self.kinds.insert(key, kind).is_some() {
            panic!("resource kind {key:?} registered twice");
        }
    }

    pub fn get(&self, key: &str) -> Option<&ResourceKind> {
        self.kinds.get(key)
    }

    pub(crate) fn require(&self, key: &str) -> Result<&ResourceKind> {
        self.get(key)
            .ok_or_else(|| MapperError::invalid(format!("unknown resource kind {key:?}")))
    }

    /// All registered kind keys, sorted for stable output.
    pub fn keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = self.kinds.keys().copied().collect();
        keys.sort_unstable();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;

    fn demo_kind(key: &'static str) -> ResourceKind {
        let schema = ResourceSchema::builder()
            .field(FieldSpec::string("name").required())
            .build();
        ResourceKind::new(key, schema, IdStrategy::RemotePath, |fields| {
            let name = fields
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| MapperError::invalid("required field \"name\" is missing"))?;
            Ok(format!("demo/{name}"))
        })
    }

    #[test]
    fn lookup_by_key() {
        let mut registry = Registry::new();
        registry.register(demo_kind("demo"));
        assert!(registry.get("demo").is_some());
        assert!(registry.get("other").is_none());
        assert_eq!(registry.keys(), vec!["demo"]);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_panics() {
        let mut registry = Registry::new();
        registry.register(demo_kind("demo"));
        registry.register(demo_kind("demo"));
    }

    #[test]
    fn server_field_read_path_prefixes_bare_ids() {
        let schema = ResourceSchema::default();
        let kind = ResourceKind::new(
            "alias",
            schema,
            IdStrategy::ServerField {
                field: "id",
                path_prefix: "identity/entity-alias/id",
            },
            |_| Ok("identity/entity-alias".to_string()),
        );
        assert_eq!(
            kind.read_path("3856fb4d"),
            "identity/entity-alias/id/3856fb4d"
        );
        assert_eq!(
            kind.read_path("identity/entity-alias/id/3856fb4d"),
            "identity/entity-alias/id/3856fb4d"
        );
    }
}
