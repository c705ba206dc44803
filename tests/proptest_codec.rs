//! Property-based tests for the codec using proptest
//!
//! These tests verify the encode/decode round-trip and encode idempotence
//! over randomized configuration records.

use proptest::option;
use proptest::prelude::*;
use serde_json::{json, Value};
use vaultmap::{codec, kinds, FieldMap, Record};

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,20}"
}

fn arb_bool_string() -> impl Strategy<Value = String> {
    prop_oneof![Just("true".to_string()), Just("false".to_string())]
}

/// Generate an entity-alias record with all required fields set.
fn arb_alias_record() -> impl Strategy<Value = Record> {
    (arb_name(), "[a-z0-9_]{6,12}", "[0-9A-F-]{8,36}").prop_map(
        |(name, accessor, canonical)| {
            let mut record = Record::new(kinds::entity_alias::KIND);
            record.set("name", name);
            record.set("mount_accessor", accessor);
            record.set("canonical_id", canonical);
            record
        },
    )
}

/// Generate a managed-key record with an aws block and optional extras.
fn arb_aws_key_record() -> impl Strategy<Value = Record> {
    (
        arb_name(),
        "[A-Z0-9]{16,20}",
        "[a-zA-Z0-9/+]{20,40}",
        prop_oneof!["2048", "3072", "4096"],
        prop_oneof!["RSA", "ECDSA"],
        option::of("[a-z0-9-]{4,16}"),
        option::of(arb_bool_string()),
        option::of(arb_bool_string()),
    )
        .prop_map(
            |(name, access_key, secret_key, key_bits, key_type, endpoint, generate, any_mount)| {
                let mut entry = json!({
                    "name": name,
                    "access_key": access_key,
                    "secret_key": secret_key,
                    "key_bits": key_bits,
                    "key_type": key_type,
                    "kms_key": format!("alias/{name}"),
                })
                .as_object()
                .unwrap()
                .clone();
                if let Some(endpoint) = endpoint {
                    entry.insert("endpoint".into(), Value::String(endpoint));
                }

                let mut record = Record::new(kinds::managed_keys::KIND);
                record.set_block("aws", vec![entry]);
                if let Some(generate) = generate {
                    record.set("allow_generate_key", generate);
                }
                if let Some(any_mount) = any_mount {
                    record.set("any_mount", any_mount);
                }
                record
            },
        )
}

/// Every field explicitly present in `expected` must appear unchanged in
/// `actual` (extra entries in `actual`, such as encode-time defaults, are
/// allowed).
fn assert_subset(expected: &FieldMap, actual: &FieldMap) {
    for (name, value) in expected {
        match (value, actual.get(name)) {
            (Value::Array(_), Some(Value::Array(_))) => {
                // block entries are compared field by field below
            }
            (expected, actual) => {
                assert_eq!(Some(expected), actual, "field {name:?} did not survive");
            }
        }
    }
}

proptest! {
    #[test]
    fn alias_round_trip_reproduces_set_fields(record in arb_alias_record()) {
        let kind = kinds::entity_alias::kind();
        let (_, payload) = codec::encode(&record, &kind).unwrap();
        let decoded = codec::decode(&payload, &kind).unwrap();
        prop_assert_eq!(&decoded, record.fields());
    }

    #[test]
    fn aws_key_round_trip_reproduces_set_fields(record in arb_aws_key_record()) {
        let kind = kinds::managed_keys::kind();
        let (_, payload) = codec::encode(&record, &kind).unwrap();
        let decoded = codec::decode(&payload, &kind).unwrap();

        assert_subset(record.fields(), &decoded);

        // block fields survive the flatten/fold cycle
        let expected_entry = record.fields()["aws"][0].as_object().unwrap();
        let decoded_entry = decoded["aws"][0].as_object().unwrap();
        for (name, value) in expected_entry {
            prop_assert_eq!(Some(value), decoded_entry.get(name), "aws.{} did not survive", name);
        }

        // absent fields without defaults stay absent
        if !record.fields().contains_key("any_mount") {
            prop_assert!(!decoded.contains_key("any_mount"));
        }
        if !expected_entry.contains_key("endpoint") {
            prop_assert!(!decoded_entry.contains_key("endpoint"));
        }

        // sibling backend blocks never materialize
        prop_assert!(!decoded.contains_key("pkcs"));
        prop_assert!(!decoded.contains_key("azure"));
    }

    #[test]
    fn encode_is_idempotent(record in arb_aws_key_record()) {
        let kind = kinds::managed_keys::kind();
        let first = codec::encode(&record, &kind).unwrap();
        let second = codec::encode(&record, &kind).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn remote_path_is_stable_and_name_derived(record in arb_aws_key_record()) {
        let kind = kinds::managed_keys::kind();
        let (path, _) = codec::encode(&record, &kind).unwrap();
        let name = record.fields()["aws"][0]["name"].as_str().unwrap();
        prop_assert_eq!(path, format!("sys/managed-keys/awskms/{}", name));
    }
}
