//! Identity entity aliases
//!
//! An alias links an authentication accessor's account name to an identity
//! entity. Aliases are created against a collection endpoint and identified
//! by a server-issued id; reads and deletes address
//! `identity/entity-alias/id/<id>`.

use crate::error::Result;
use crate::record::FieldMap;
use crate::schema::registry::{IdStrategy, ResourceKind};
use crate::schema::{FieldSpec, ResourceSchema};

pub const KIND: &str = "entity-alias";

const CREATE_PATH: &str = "identity/entity-alias";
const ID_PATH_PREFIX: &str = "identity/entity-alias/id";

pub fn kind() -> ResourceKind {
    ResourceKind::new(
        KIND,
        schema(),
        IdStrategy::ServerField {
            field: "id",
            path_prefix: ID_PATH_PREFIX,
        },
        remote_path,
    )
}

fn remote_path(_fields: &FieldMap) -> Result<String> {
    Ok(CREATE_PATH.to_string())
}

fn schema() -> ResourceSchema {
    ResourceSchema::builder()
        .field(
            FieldSpec::string("name")
                .required()
                .describe("Name of the alias; should be the identifier of the client in the authentication source"),
        )
        .field(
            FieldSpec::string("mount_accessor")
                .required()
                .describe("Accessor of the mount to which the alias should belong to"),
        )
        .field(
            FieldSpec::string("canonical_id")
                .required()
                .describe("ID of the entity to which this alias belongs"),
        )
        .build()
}
