//! Configuration records
//!
//! A [`Record`] is the in-memory representation of one resource instance:
//! a presence-aware field map plus the identifier and lifecycle state managed
//! by the driver. Field presence is meaningful: an absent field is distinct
//! from an empty one, and only explicitly-set fields are encoded.

use serde_json::Value;

/// Untyped key-value payload, as exchanged with the remote API.
pub type FieldMap = serde_json::Map<String, Value>;

/// Lifecycle state of a resource instance.
///
/// `Synced` is re-entered after every successful read or update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Unmanaged,
    Created,
    Synced,
    Deleted,
}

/// One resource instance: configured fields, identifier, lifecycle state.
#[derive(Debug, Clone)]
pub struct Record {
    kind: String,
    id: Option<String>,
    state: State,
    fields: FieldMap,
    /// Snapshot of the fields as last written to or read from the remote,
    /// used to detect replace-triggering changes before an update.
    prior: Option<FieldMap>,
}

impl Record {
    pub fn new(kind: impl Into<String>) -> Self {
        Record {
            kind: kind.into(),
            id: None,
            state: State::Unmanaged,
            fields: FieldMap::new(),
            prior: None,
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Set a scalar field.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Set a nested block to the given entries.
    pub fn set_block(&mut self, name: impl Into<String>, entries: Vec<FieldMap>) -> &mut Self {
        let entries = entries.into_iter().map(Value::Object).collect();
        self.fields.insert(name.into(), Value::Array(entries));
        self
    }

    /// Remove a field, returning it to the absent state.
    pub fn unset(&mut self, name: &str) -> &mut Self {
        self.fields.remove(name);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    pub(crate) fn assign_id(&mut self, id: String) {
        self.id = Some(id);
    }

    pub(crate) fn clear_id(&mut self) {
        self.id = None;
    }

    pub(crate) fn set_state(&mut self, state: State) {
        self.state = state;
    }

    /// Merge decoded remote fields into the record, overwriting matches.
    /// Fields the remote did not report (e.g. write-only secrets) survive.
    pub(crate) fn merge_fields(&mut self, fields: FieldMap) {
        for (name, value) in fields {
            self.fields.insert(name, value);
        }
    }

    pub(crate) fn replace_fields(&mut self, fields: FieldMap) {
        self.fields = fields;
    }

    pub(crate) fn snapshot_prior(&mut self) {
        self.prior = Some(self.fields.clone());
    }

    pub(crate) fn prior(&self) -> Option<&FieldMap> {
        self.prior.as_ref()
    }
}

/// Look up a field inside the first entry of a nested block.
pub(crate) fn block_entry_field<'a>(
    fields: &'a FieldMap,
    block: &str,
    field: &str,
) -> Option<&'a Value> {
    match fields.get(block)? {
        Value::Array(entries) => match entries.first()? {
            Value::Object(inner) => inner.get(field),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn presence_is_distinct_from_empty() {
        let mut record = Record::new("entity-alias");
        assert!(record.get("name").is_none());
        record.set("name", "");
        assert_eq!(record.get("name"), Some(&json!("")));
        record.unset("name");
        assert!(record.get("name").is_none());
    }

    #[test]
    fn block_entry_lookup() {
        let mut record = Record::new("managed-keys");
        let mut entry = FieldMap::new();
        entry.insert("name".into(), json!("k1"));
        record.set_block("aws", vec![entry]);
        assert_eq!(
            block_entry_field(record.fields(), "aws", "name"),
            Some(&json!("k1"))
        );
        assert!(block_entry_field(record.fields(), "aws", "region").is_none());
        assert!(block_entry_field(record.fields(), "pkcs", "name").is_none());
    }

    #[test]
    fn merge_preserves_unreported_fields() {
        let mut record = Record::new("managed-keys");
        record.set("pin", "1234");
        let mut remote = FieldMap::new();
        remote.insert("any_mount".into(), json!("true"));
        record.merge_fields(remote);
        assert_eq!(record.get_str("pin"), Some("1234"));
        assert_eq!(record.get_str("any_mount"), Some("true"));
    }
}
