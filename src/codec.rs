//! Encoder / decoder
//!
//! Schema-driven marshaling between typed configuration records and the
//! untyped key-value payloads the remote API speaks. Encoding is a write-time
//! concern (presence rules, defaults, block flattening, path computation);
//! decoding is a read-time concern (declared-fields-only copy, type coercion,
//! no defaulting, since defaults applied on read would mask genuine remote
//! drift).

use crate::error::{MapperError, Result};
use crate::record::{FieldMap, Record};
use crate::schema::registry::ResourceKind;
use crate::schema::{BlockSpec, FieldSpec, FieldType};
use serde_json::Value;

/// Encode a record into its remote path and payload.
///
/// Only fields explicitly present in the record are included, except fields
/// carrying a default, which are filled in when absent. Of the nested blocks,
/// the first present in declaration order is flattened: its inner fields
/// merge into the payload unprefixed. That same block drives the path, so
/// sibling blocks never leak fields into an object addressed by another
/// backend. Validation runs first, so no remote call is ever attempted for an
/// invalid configuration.
pub fn encode(record: &Record, kind: &ResourceKind) -> Result<(String, FieldMap)> {
    let schema = kind.schema();
    schema.validate(record.fields())?;
    let path = kind.remote_path(record.fields())?;

    let mut payload = FieldMap::new();

    for block in schema.blocks() {
        if let Some(entry) = first_block_entry(record.fields(), block.name) {
            for spec in &block.fields {
                if let Some(value) = entry.get(spec.name) {
                    payload.insert(spec.name.to_string(), value.clone());
                } else if let Some(default) = &spec.default {
                    payload.insert(spec.name.to_string(), default.clone());
                }
            }
            break;
        }
    }

    for spec in schema.fields() {
        if let Some(value) = record.get(spec.name) {
            payload.insert(spec.name.to_string(), value.clone());
        } else if let Some(default) = &spec.default {
            payload.insert(spec.name.to_string(), default.clone());
        }
    }

    Ok((path, payload))
}

/// Decode a remote payload into a configuration field map.
///
/// Copies only fields that are both present in the payload and declared in
/// the schema; unrecognized remote fields are dropped for forward
/// compatibility. Flattened block fields are folded back into their block when
/// the payload carries all of the block's required fields. Fields absent from
/// the payload stay absent.
pub fn decode(payload: &FieldMap, kind: &ResourceKind) -> Result<FieldMap> {
    let schema = kind.schema();
    let mut fields = FieldMap::new();

    for spec in schema.fields() {
        if let Some(raw) = payload.get(spec.name) {
            fields.insert(spec.name.to_string(), coerce(spec, raw)?);
        }
    }

    for block in schema.blocks() {
        if let Some(entry) = fold_block(payload, block)? {
            fields.insert(block.name.to_string(), Value::Array(vec![Value::Object(entry)]));
        }
    }

    Ok(fields)
}

/// Reconstruct one block entry from a flattened payload.
///
/// A block is considered present when every one of its required fields
/// appears in the payload; the required sets of sibling blocks are disjoint
/// enough to disambiguate which backend a read response describes.
fn fold_block(payload: &FieldMap, block: &BlockSpec) -> Result<Option<FieldMap>> {
    let complete = block
        .fields
        .iter()
        .filter(|spec| spec.required)
        .all(|spec| payload.contains_key(spec.name));
    if !complete {
        return Ok(None);
    }

    let mut entry = FieldMap::new();
    for spec in &block.fields {
        if let Some(raw) = payload.get(spec.name) {
            entry.insert(spec.name.to_string(), coerce(spec, raw)?);
        }
    }
    Ok(Some(entry))
}

fn coerce(spec: &FieldSpec, raw: &Value) -> Result<Value> {
    match spec.field_type {
        FieldType::String => match raw {
            Value::String(_) => Ok(raw.clone()),
            // the remote returns numerics (key sizes, slots) untyped
            Value::Number(n) => Ok(Value::String(n.to_string())),
            other => Err(MapperError::decode(
                spec.name,
                format!("expected a string, got {other}"),
            )),
        },
        FieldType::BoolString => match raw {
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            Value::String(s) if s == "true" || s == "false" => Ok(raw.clone()),
            other => Err(MapperError::decode(
                spec.name,
                format!("expected a boolean or \"true\"/\"false\", got {other}"),
            )),
        },
    }
}

fn first_block_entry<'a>(fields: &'a FieldMap, block: &str) -> Option<&'a FieldMap> {
    match fields.get(block)? {
        Value::Array(entries) => match entries.first()? {
            Value::Object(inner) => Some(inner),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinds;
    use serde_json::json;

    fn managed_keys() -> crate::schema::registry::ResourceKind {
        kinds::managed_keys::kind()
    }

    fn entity_alias() -> crate::schema::registry::ResourceKind {
        kinds::entity_alias::kind()
    }

    fn aws_record() -> Record {
        let mut record = Record::new(kinds::managed_keys::KIND);
        record.set("allow_generate_key", "true");
        let entry = json!({
            "name": "key_1",
            "access_key": "AKIA123",
            "secret_key": "s3cr3t",
            "key_bits": "4096",
            "key_type": "RSA",
            "kms_key": "alias/key_1",
        });
        record.set_block("aws", vec![entry.as_object().unwrap().clone()]);
        record
    }

    #[test]
    fn aws_block_flattens_and_derives_path() {
        let kind = managed_keys();
        let (path, payload) = encode(&aws_record(), &kind).unwrap();
        assert_eq!(path, "sys/managed-keys/awskms/key_1");
        assert_eq!(payload.get("access_key"), Some(&json!("AKIA123")));
        assert_eq!(payload.get("allow_generate_key"), Some(&json!("true")));
        // defaulted at encode time
        assert_eq!(payload.get("region"), Some(&json!("us-east-1")));
        // absent optional field with no default stays out
        assert!(!payload.contains_key("endpoint"));
        assert!(!payload.contains_key("any_mount"));
    }

    #[test]
    fn encode_is_deterministic() {
        let kind = managed_keys();
        let record = aws_record();
        let first = encode(&record, &kind).unwrap();
        let second = encode(&record, &kind).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn entity_alias_payload_matches_set_fields() {
        let kind = entity_alias();
        let mut record = Record::new(kinds::entity_alias::KIND);
        record.set("name", "user_1");
        record.set("mount_accessor", "token_1f2bd5");
        record.set("canonical_id", "49877D63-09AD-4B85-ABF2-52A126A994FB");
        let (path, payload) = encode(&record, &kind).unwrap();
        assert_eq!(path, "identity/entity-alias");
        assert_eq!(
            Value::Object(payload),
            json!({
                "name": "user_1",
                "mount_accessor": "token_1f2bd5",
                "canonical_id": "49877D63-09AD-4B85-ABF2-52A126A994FB",
            })
        );
    }

    #[test]
    fn missing_key_field_fails_before_any_remote_call() {
        let kind = managed_keys();
        let record = Record::new(kinds::managed_keys::KIND);
        let err = encode(&record, &kind).unwrap_err();
        assert!(matches!(err, MapperError::InvalidConfiguration { .. }));
    }

    #[test]
    fn decode_round_trips_the_aws_block() {
        let kind = managed_keys();
        let record = aws_record();
        let (_, payload) = encode(&record, &kind).unwrap();
        let decoded = decode(&payload, &kind).unwrap();
        assert_eq!(decoded.get("allow_generate_key"), Some(&json!("true")));
        let entry = crate::record::block_entry_field(&decoded, "aws", "access_key");
        assert_eq!(entry, Some(&json!("AKIA123")));
        // sibling blocks stay absent
        assert!(!decoded.contains_key("pkcs"));
        assert!(!decoded.contains_key("azure"));
    }

    #[test]
    fn decode_drops_unknown_remote_fields() {
        let kind = entity_alias();
        let payload = json!({
            "name": "user_1",
            "creation_time": "2026-08-25T00:00:00Z",
            "local": false,
        });
        let decoded = decode(payload.as_object().unwrap(), &kind).unwrap();
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded.get("name"), Some(&json!("user_1")));
    }

    #[test]
    fn decode_coerces_loose_remote_types() {
        let kind = managed_keys();
        let payload = json!({
            "allow_generate_key": true,
            "any_mount": "false",
        });
        let decoded = decode(payload.as_object().unwrap(), &kind).unwrap();
        assert_eq!(decoded.get("allow_generate_key"), Some(&json!("true")));
        assert_eq!(decoded.get("any_mount"), Some(&json!("false")));
    }

    #[test]
    fn decode_rejects_uncoercible_values() {
        let kind = managed_keys();
        let payload = json!({"allow_generate_key": "sometimes"});
        let err = decode(payload.as_object().unwrap(), &kind).unwrap_err();
        assert!(matches!(err, MapperError::Decode { ref field, .. } if field == "allow_generate_key"));
    }

    #[test]
    fn both_aws_and_pkcs_blocks_are_schema_legal() {
        let kind = managed_keys();
        let mut record = aws_record();
        let pkcs = json!({
            "name": "hsm_1",
            "library": "softhsm",
            "key_label": "lbl",
            "key_id": "0x1",
            "mechanism": "0x0001",
            "pin": "1234",
        });
        record.set_block("pkcs", vec![pkcs.as_object().unwrap().clone()]);
        // pkcs is declared first, so it selects the path
        let (path, _) = encode(&record, &kind).unwrap();
        assert_eq!(path, "sys/managed-keys/pkcs11/hsm_1");
    }

    #[test]
    fn only_the_path_selecting_block_is_flattened() {
        let kind = managed_keys();
        let mut record = aws_record();
        let pkcs = json!({
            "name": "hsm_1",
            "library": "softhsm",
            "key_label": "lbl",
            "key_id": "0x1",
            "mechanism": "0x0001",
            "pin": "1234",
            "key_bits": "256",
        });
        record.set_block("pkcs", vec![pkcs.as_object().unwrap().clone()]);

        let (path, payload) = encode(&record, &kind).unwrap();
        assert_eq!(path, "sys/managed-keys/pkcs11/hsm_1");
        // the payload describes the same backend the path addresses
        assert_eq!(payload.get("name"), Some(&json!("hsm_1")));
        assert_eq!(payload.get("key_bits"), Some(&json!("256")));
        assert_eq!(payload.get("library"), Some(&json!("softhsm")));
        assert!(!payload.contains_key("access_key"));
        assert!(!payload.contains_key("kms_key"));
        assert!(!payload.contains_key("region"));
    }

    #[test]
    fn malformed_flag_never_reaches_the_encoder_output() {
        let kind = managed_keys();
        let mut record = aws_record();
        record.set("allow_generate_key", "sometimes");
        let err = encode(&record, &kind).unwrap_err();
        assert!(matches!(err, MapperError::InvalidConfiguration { .. }), "{err}");
    }
}
