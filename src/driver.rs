//! Lifecycle driver
//!
//! Orchestrates Create, Read, Update, Delete, Import and Replace for one
//! configuration record at a time, using the codec for marshaling and a
//! [`RemoteApi`] implementation for I/O. The driver holds no state of its own
//! beyond the registry and client references, so one driver can serve many
//! distinct records concurrently; operations on a single record are
//! sequential by construction (`&mut Record`).
//!
//! State machine per record: `Unmanaged → Created → Synced → Deleted`, with
//! `Synced` re-entered after every successful read or update.

use crate::codec;
use crate::error::{MapperError, Result};
use crate::record::{block_entry_field, Record, State};
use crate::remote::RemoteApi;
use crate::schema::registry::{IdStrategy, Registry, ResourceKind};
use serde_json::Value;

/// Result of a read: distinguishes sync from drift reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Remote state was read and folded into the record.
    Synced,
    /// The remote object is gone; the record was marked deleted. Not an
    /// error: reads reconcile drift on resources the system already owns.
    Removed,
    /// The record was already deleted; nothing was done.
    AlreadyDeleted,
}

/// Drives resource lifecycles against a remote API.
pub struct Driver<'a, C> {
    registry: &'a Registry,
    remote: &'a C,
}

impl<'a, C: RemoteApi> Driver<'a, C> {
    pub fn new(registry: &'a Registry, remote: &'a C) -> Self {
        Driver { registry, remote }
    }

    /// Create the resource at its computed remote path and assign the
    /// identifier. The record must be fully populated and unmanaged; it stays
    /// unmanaged if the remote write fails.
    pub async fn create(&self, record: &mut Record) -> Result<()> {
        if record.state() != State::Unmanaged {
            return Err(MapperError::invalid(
                "create requires an unmanaged record",
            ));
        }
        let kind = self.registry.require(record.kind())?;
        let (path, payload) = codec::encode(record, kind)?;

        tracing::info!(kind = record.kind(), %path, "creating resource");
        let response = self.remote.write(&path, &payload).await?;

        let id = match kind.id_strategy() {
            IdStrategy::RemotePath => path,
            IdStrategy::ServerField { field, .. } => response
                .as_ref()
                .and_then(|data| data.get(field))
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    MapperError::decode(field, "create response did not include the identifier")
                })?,
        };

        record.assign_id(id);
        record.snapshot_prior();
        record.set_state(State::Created);
        Ok(())
    }

    /// Read remote state back into the record.
    ///
    /// A missing remote object is absorbed as a state transition to
    /// `Deleted` (drift reconciliation), not surfaced as an error.
    pub async fn read(&self, record: &mut Record) -> Result<ReadOutcome> {
        if record.state() == State::Deleted {
            return Ok(ReadOutcome::AlreadyDeleted);
        }
        let kind = self.registry.require(record.kind())?;
        let id = record
            .id()
            .ok_or_else(|| MapperError::invalid("read requires an identifier"))?;
        let path = kind.read_path(id);

        tracing::debug!(%path, "reading resource");
        match self.remote.read(&path).await? {
            None => {
                tracing::info!(%path, "remote object missing, reconciling record as deleted");
                record.clear_id();
                record.set_state(State::Deleted);
                Ok(ReadOutcome::Removed)
            }
            Some(payload) => {
                let fields = codec::decode(&payload, kind)?;
                record.merge_fields(fields);
                record.snapshot_prior();
                record.set_state(State::Synced);
                Ok(ReadOutcome::Synced)
            }
        }
    }

    /// Push changed fields to the remote object in place.
    ///
    /// Fails with `ReplacementRequired` when a replace-triggering field
    /// changed since the last sync; the caller should [`Driver::replace`]
    /// instead.
    pub async fn update(&self, record: &mut Record) -> Result<()> {
        if record.state() != State::Synced {
            return Err(MapperError::invalid("update requires a synced record"));
        }
        let kind = self.registry.require(record.kind())?;
        if let Some(field) = changed_force_new_field(record, kind) {
            return Err(MapperError::ReplacementRequired { field });
        }

        let (_, payload) = codec::encode(record, kind)?;
        let id = record
            .id()
            .ok_or_else(|| MapperError::invalid("update requires an identifier"))?;
        let path = kind.read_path(id);

        tracing::info!(kind = record.kind(), %path, "updating resource");
        self.remote.write(&path, &payload).await?;
        record.snapshot_prior();
        Ok(())
    }

    /// Delete the remote object. Remote absence counts as success, so the
    /// operation is idempotent.
    pub async fn delete(&self, record: &mut Record) -> Result<()> {
        let kind = self.registry.require(record.kind())?;
        let id = record
            .id()
            .ok_or_else(|| MapperError::invalid("delete requires an identifier"))?;
        let path = kind.read_path(id);

        tracing::info!(kind = record.kind(), %path, "deleting resource");
        self.remote.delete(&path).await?;
        record.clear_id();
        record.set_state(State::Deleted);
        Ok(())
    }

    /// Delete and recreate, for replace-triggering field changes.
    pub async fn replace(&self, record: &mut Record) -> Result<()> {
        self.delete(record).await?;
        record.set_state(State::Unmanaged);
        self.create(record).await
    }

    /// Establish ownership of an existing remote object from its identifier.
    ///
    /// Unlike `read`, a missing target is a hard `NotFound`: import is the
    /// trust-establishing first contact, and a missing object there is an
    /// operator mistake rather than drift.
    pub async fn import(&self, kind_key: &str, identifier: &str) -> Result<Record> {
        let kind = self.registry.require(kind_key)?;
        let path = kind.read_path(identifier);

        tracing::info!(kind = kind_key, %path, "importing resource");
        match self.remote.read(&path).await? {
            None => Err(MapperError::NotFound { path }),
            Some(payload) => {
                let fields = codec::decode(&payload, kind)?;
                let mut record = Record::new(kind_key);
                record.replace_fields(fields);
                record.assign_id(identifier.to_string());
                record.snapshot_prior();
                record.set_state(State::Synced);
                Ok(record)
            }
        }
    }
}

/// Find the first replace-triggering field whose value differs from the last
/// synced snapshot, including fields inside nested blocks.
fn changed_force_new_field(record: &Record, kind: &ResourceKind) -> Option<String> {
    let prior = record.prior()?;

    for spec in kind.schema().fields().filter(|s| s.force_new) {
        if record.get(spec.name) != prior.get(spec.name) {
            return Some(spec.name.to_string());
        }
    }

    for block in kind.schema().blocks() {
        for spec in block.fields.iter().filter(|s| s.force_new) {
            let current = block_entry_field(record.fields(), block.name, spec.name);
            let previous = block_entry_field(prior, block.name, spec.name);
            if current != previous {
                return Some(format!("{}.{}", block.name, spec.name));
            }
        }
    }

    None
}
