//! Managed encryption keys
//!
//! Keys held in an external KMS backend (PKCS#11 HSM, AWS KMS, Azure Key
//! Vault) and referenced from the secrets service. Each backend is declared
//! as its own single-entry block; the backend type and the block's `name`
//! field together form the remote path, which also serves as the identifier.

use crate::error::{MapperError, Result};
use crate::record::{block_entry_field, FieldMap};
use crate::schema::registry::{IdStrategy, ResourceKind};
use crate::schema::{BlockSpec, FieldSpec, ResourceSchema};
use serde_json::Value;

pub const KIND: &str = "managed-keys";

pub const KMS_TYPE_PKCS: &str = "pkcs11";
pub const KMS_TYPE_AWS: &str = "awskms";
pub const KMS_TYPE_AZURE: &str = "azurekeyvault";

/// Backend blocks in declaration order, paired with their KMS type segment.
/// When several blocks are configured, the first present one selects the
/// backend type and name for the path.
const BACKEND_BLOCKS: &[(&str, &str)] = &[
    ("pkcs", KMS_TYPE_PKCS),
    ("aws", KMS_TYPE_AWS),
    ("azure", KMS_TYPE_AZURE),
];

pub fn kind() -> ResourceKind {
    ResourceKind::new(KIND, schema(), IdStrategy::RemotePath, remote_path)
}

/// `sys/managed-keys/<backend-type>/<name>`
pub fn managed_keys_path(kms_type: &str, name: &str) -> String {
    format!("sys/managed-keys/{kms_type}/{name}")
}

fn remote_path(fields: &FieldMap) -> Result<String> {
    for (block, kms_type) in BACKEND_BLOCKS {
        if let Some(Value::String(name)) = block_entry_field(fields, block, "name") {
            return Ok(managed_keys_path(kms_type, name));
        }
    }
    Err(MapperError::invalid(
        "managed key requires a named pkcs, aws or azure backend block",
    ))
}

fn schema() -> ResourceSchema {
    ResourceSchema::builder()
        .field(
            FieldSpec::bool_string("allow_generate_key")
                .computed()
                .describe(
                    "If no existing key can be found in the referenced backend, \
                     instructs the server to generate a key within the backend",
                ),
        )
        .field(FieldSpec::bool_string("allow_store_key").computed().describe(
            "Controls the ability to import a key to the configured backend; \
             if 'false', those operations are forbidden",
        ))
        .field(
            FieldSpec::bool_string("any_mount")
                .computed()
                .describe("Allow usage from any mount point within the namespace if 'true'"),
        )
        .block(
            BlockSpec::new("pkcs", 1, pkcs_fields())
                .describe("Configuration block for PKCS#11 managed keys"),
        )
        .block(
            BlockSpec::new("aws", 1, aws_fields())
                .describe("Configuration block for AWS KMS managed keys"),
        )
        .block(
            BlockSpec::new("azure", 1, azure_fields())
                .describe("Configuration block for Azure Key Vault managed keys"),
        )
        .build()
}

fn pkcs_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::string("name")
            .required()
            .force_new()
            .describe("A unique lowercase name that identifies the key"),
        FieldSpec::string("library").required().describe(
            "The name of the kms_library stanza to use from the server's \
             config to lookup the local library path",
        ),
        FieldSpec::string("key_label")
            .required()
            .describe("The label of the key to use"),
        FieldSpec::string("key_id")
            .required()
            .describe("The id of a PKCS#11 key to use"),
        FieldSpec::string("mechanism").required().describe(
            "The encryption/decryption mechanism to use, specified as a \
             hexadecimal (prefixed by 0x) string",
        ),
        FieldSpec::string("pin").required().describe("The PIN for login"),
        FieldSpec::string("slot").describe(
            "The slot number to use, specified as a string in a decimal format \
             (e.g. '2305843009213693953')",
        ),
        FieldSpec::string("token_label").describe("The label of the token to use"),
        FieldSpec::string("curve").describe(
            "Supplies the curve value when using the 'CKM_ECDSA' mechanism. \
             Required if 'allow_generate_key' is true",
        ),
        FieldSpec::string("key_bits").describe(
            "Supplies the size in bits of the key when using 'CKM_RSA_PKCS_PSS', \
             'CKM_RSA_PKCS_OAEP' or 'CKM_RSA_PKCS' as a value for 'mechanism'. \
             Required if 'allow_generate_key' is true",
        ),
        FieldSpec::string("force_rw_session").describe(
            "Force all operations to open up a read-write session to the HSM",
        ),
    ]
}

fn aws_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::string("name")
            .required()
            .force_new()
            .describe("A unique lowercase name that identifies the key"),
        FieldSpec::string("access_key").required().describe(
            "The AWS access key to use. This can also be provided with the \
             'AWS_ACCESS_KEY_ID' env variable",
        ),
        FieldSpec::string("secret_key").required().describe(
            "The AWS secret key to use. This can also be provided with the \
             'AWS_SECRET_ACCESS_KEY' env variable",
        ),
        FieldSpec::string("curve").describe(
            "The curve to use for an ECDSA key. Used when key_type is 'ECDSA'. \
             Required if 'allow_generate_key' is true",
        ),
        FieldSpec::string("endpoint").describe("Used to specify a custom AWS endpoint"),
        FieldSpec::string("key_bits").required().describe(
            "The size in bits for an RSA key. This field is required when \
             'key_type' is 'RSA'",
        ),
        FieldSpec::string("key_type")
            .required()
            .describe("The type of key to use"),
        FieldSpec::string("kms_key")
            .required()
            .describe("An identifier for the key"),
        FieldSpec::string("region")
            .default_value("us-east-1")
            .describe("The AWS region where the keys are stored (or will be stored)"),
    ]
}

fn azure_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec::string("name")
            .required()
            .force_new()
            .describe("A unique lowercase name that identifies the key"),
        FieldSpec::string("tenant_id")
            .required()
            .describe("The tenant id for the Azure Active Directory organization"),
        FieldSpec::string("client_id")
            .required()
            .describe("The client id for credentials to query the Azure APIs"),
        FieldSpec::string("client_secret")
            .required()
            .describe("The client secret for credentials to query the Azure APIs"),
        FieldSpec::string("environment")
            .default_value("AZUREPUBLICCLOUD")
            .describe("The Azure Cloud environment API endpoints to use"),
        FieldSpec::string("vault_name").required().describe(
            "The Key Vault vault to use for encryption and decryption",
        ),
        FieldSpec::string("key_name")
            .required()
            .describe("The Key Vault key to use for encryption and decryption"),
        FieldSpec::string("resource")
            .default_value("vault.azure.net")
            .describe("The Azure Key Vault resource's DNS Suffix to connect to"),
        FieldSpec::string("key_bits").describe(
            "The size in bits for an RSA key. This field is required when \
             'key_type' is 'RSA' or when 'allow_generate_key' is true",
        ),
        FieldSpec::string("key_type")
            .required()
            .describe("The type of key to use"),
    ]
}
