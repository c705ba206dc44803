//! vaultmap - declarative resource mapping for Vault-style secrets APIs
//!
//! This crate maps declarative resource definitions onto create/read/update/
//! delete calls against a path-addressed secrets-management HTTP API. A
//! configuration engine supplies populated records; the mapper validates them
//! against registered schemas, marshals them to and from the untyped
//! key-value payloads the remote API speaks, and reconciles local state with
//! remote state.
//!
//! # Architecture
//!
//! - [`schema`] - field and block declarations plus the resource kind registry
//! - [`record`] - presence-aware configuration records and lifecycle state
//! - [`codec`] - schema-driven encode/decode between records and payloads
//! - [`remote`] - the path-addressed key-value API boundary and HTTP client
//! - [`driver`] - the Create/Read/Update/Delete/Import lifecycle driver
//! - [`kinds`] - built-in resource kinds (managed keys, entity aliases)
//!
//! # Example
//!
//! ```no_run
//! use vaultmap::{kinds, ClientConfig, Driver, Record, VaultClient};
//!
//! # async fn demo() -> vaultmap::Result<()> {
//! let registry = kinds::builtin_registry();
//! let client = VaultClient::new(ClientConfig::from_env()?)?;
//! let driver = Driver::new(&registry, &client);
//!
//! let mut alias = Record::new(kinds::entity_alias::KIND);
//! alias.set("name", "user_1");
//! alias.set("mount_accessor", "auth_token_1f2bd5");
//! alias.set("canonical_id", "49877d63-09ad-4b85-abf2-52a126a994fb");
//! driver.create(&mut alias).await?;
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod driver;
pub mod error;
pub mod kinds;
pub mod record;
pub mod remote;
pub mod schema;

pub use driver::{Driver, ReadOutcome};
pub use error::{Diagnostic, MapperError, Result, Severity};
pub use record::{FieldMap, Record, State};
pub use remote::{ClientConfig, RemoteApi, VaultClient};
pub use schema::registry::{IdStrategy, Registry, ResourceKind};
pub use schema::{BlockSpec, FieldSpec, FieldType, ResourceSchema};
