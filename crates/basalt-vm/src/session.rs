//! # Execution Sessions
//!
//! A session is one gas-metered execution against a storage snapshot. All
//! mutations are buffered into a write set with read-your-writes
//! semantics; nothing touches the backing store until the caller applies
//! the write set after a successful run. Mid-call gas exhaustion therefore
//! leaks no partial state through the boundary: the host's own storage
//! transaction remains the outer guard.

use crate::backend::Storage;
use crate::errors::{BackendResult, VmError};
use crate::gas::{costs, GasMeter};
use basalt_types::{AccessPath, AccountAddress, CompiledModule, ModuleId};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::collections::BTreeMap;

// =============================================================================
// WRITE SETS
// =============================================================================

/// A buffered storage mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    /// Write the value.
    Set(Vec<u8>),
    /// Delete the entry.
    Delete,
}

/// The ordered set of mutations produced by one session. Last write per
/// access path wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteSet {
    ops: BTreeMap<AccessPath, Op>,
}

impl WriteSet {
    /// Number of touched access paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// True when no mutation was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Iterates mutations in access-path order.
    pub fn iter(&self) -> impl Iterator<Item = (&AccessPath, &Op)> {
        self.ops.iter()
    }

    fn record(&mut self, path: AccessPath, op: Op) {
        self.ops.insert(path, op);
    }

    fn pending(&self, path: &AccessPath) -> Option<&Op> {
        self.ops.get(path)
    }
}

/// Applies a write set to the backing store.
///
/// Called only after successful execution; on failure the write set is
/// dropped unapplied.
///
/// # Errors
///
/// Propagates the first backend failure.
pub fn apply_write_set<S: Storage>(storage: &mut S, write_set: &WriteSet) -> BackendResult<()> {
    for (path, op) in write_set.iter() {
        let key = path.to_key();
        match op {
            Op::Set(value) => storage.set(&key, value)?,
            Op::Delete => storage.remove(&key)?,
        }
    }
    Ok(())
}

// =============================================================================
// EVENTS AND SIZE DELTAS
// =============================================================================

/// An event emitted by contract code during a session.
#[derive(Clone, PartialEq, Eq)]
pub struct ContractEvent {
    /// Session-derived event key.
    key: [u8; 32],
    /// Position of this event within the session.
    sequence_number: u64,
    /// Emitting location: module id string, or `script`.
    location: String,
    /// Opaque event payload.
    data: Vec<u8>,
}

impl ContractEvent {
    /// The event key (the session hash).
    #[must_use]
    pub fn key(&self) -> &[u8; 32] {
        &self.key
    }

    /// Position within the emitting session.
    #[must_use]
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Emitting location label.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Event payload bytes.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl Serialize for ContractEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ContractEvent", 4)?;
        state.serialize_field("key", &hex::encode(self.key))?;
        state.serialize_field("sequence_number", &self.sequence_number)?;
        state.serialize_field("location", &self.location)?;
        state.serialize_field("data", &hex::encode(&self.data))?;
        state.end()
    }
}

impl std::fmt::Debug for ContractEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ContractEvent {{ key: {}, seq: {}, location: {}, data: {} }}",
            hex::encode(self.key),
            self.sequence_number,
            self.location,
            hex::encode(&self.data)
        )
    }
}

/// Net storage-size change for one account over a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SizeDelta {
    /// Account whose footprint changed.
    pub address: AccountAddress,
    /// Absolute change in bytes.
    pub amount: u64,
    /// Whether the footprint shrank.
    pub is_decrease: bool,
}

impl Serialize for SizeDelta {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("SizeDelta", 3)?;
        state.serialize_field("address", &self.address.to_string())?;
        state.serialize_field("amount", &self.amount)?;
        state.serialize_field("is_decrease", &self.is_decrease)?;
        state.end()
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// One metered execution over a storage snapshot.
pub struct Session<'a, S: Storage> {
    storage: &'a S,
    meter: GasMeter,
    session_hash: [u8; 32],
    read_only: bool,
    writes: WriteSet,
    events: Vec<ContractEvent>,
    size_deltas: BTreeMap<AccountAddress, i64>,
}

impl<'a, S: Storage> Session<'a, S> {
    /// Opens a session over `storage`.
    ///
    /// The session hash is the Keccak-256 of the host-supplied seed and
    /// keys every event the session emits.
    #[must_use]
    pub fn new(storage: &'a S, session_seed: &[u8], meter: GasMeter, read_only: bool) -> Self {
        let session_hash: [u8; 32] = Keccak256::digest(session_seed).into();
        Self {
            storage,
            meter,
            session_hash,
            read_only,
            writes: WriteSet::default(),
            events: Vec::new(),
            size_deltas: BTreeMap::new(),
        }
    }

    /// The session hash derived from the host seed.
    #[must_use]
    pub fn session_hash(&self) -> &[u8; 32] {
        &self.session_hash
    }

    /// True when the session rejects mutations.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Mutable access to the gas meter, for instruction charges.
    pub fn meter_mut(&mut self) -> &mut GasMeter {
        &mut self.meter
    }

    /// Reads through pending writes, then the backing store. Charges
    /// storage-read gas.
    ///
    /// # Errors
    ///
    /// Gas exhaustion or a backend failure.
    pub fn read(&mut self, path: &AccessPath) -> Result<Option<Vec<u8>>, VmError> {
        self.meter.charge(costs::STORAGE_READ_BASE)?;
        let value = self.peek(path)?;
        if let Some(bytes) = &value {
            self.meter
                .charge(bytes.len() as u64 * costs::STORAGE_READ_PER_BYTE)?;
        }
        Ok(value)
    }

    /// Buffers a write. Charges storage-write gas and tracks the owning
    /// account's size delta.
    ///
    /// # Errors
    ///
    /// [`VmError::WriteInReadOnlyContext`] in a read-only session, gas
    /// exhaustion, or a backend failure while sizing the old value.
    pub fn write(&mut self, path: AccessPath, value: Vec<u8>) -> Result<(), VmError> {
        if self.read_only {
            return Err(VmError::WriteInReadOnlyContext);
        }
        self.meter.charge(
            costs::STORAGE_WRITE_BASE + value.len() as u64 * costs::STORAGE_WRITE_PER_BYTE,
        )?;
        let old_len = self.peek(&path)?.map_or(0, |v| v.len()) as i64;
        let delta = value.len() as i64 - old_len;
        *self.size_deltas.entry(path.address).or_insert(0) += delta;
        self.writes.record(path, Op::Set(value));
        Ok(())
    }

    /// Buffers a delete. Charges remove gas and tracks the size delta.
    ///
    /// # Errors
    ///
    /// [`VmError::WriteInReadOnlyContext`] in a read-only session, gas
    /// exhaustion, or a backend failure.
    pub fn remove(&mut self, path: AccessPath) -> Result<(), VmError> {
        if self.read_only {
            return Err(VmError::WriteInReadOnlyContext);
        }
        self.meter.charge(costs::STORAGE_REMOVE)?;
        let old_len = self.peek(&path)?.map_or(0, |v| v.len()) as i64;
        *self.size_deltas.entry(path.address).or_insert(0) -= old_len;
        self.writes.record(path, Op::Delete);
        Ok(())
    }

    /// Emits a contract event. Charges emission gas.
    ///
    /// # Errors
    ///
    /// Gas exhaustion.
    pub fn emit(&mut self, location: String, data: Vec<u8>) -> Result<(), VmError> {
        self.meter
            .charge(costs::EMIT_BASE + data.len() as u64 * costs::EMIT_PER_BYTE)?;
        self.events.push(ContractEvent {
            key: self.session_hash,
            sequence_number: self.events.len() as u64,
            location,
            data,
        });
        Ok(())
    }

    /// Loads and decodes a published module. Charges read gas.
    ///
    /// # Errors
    ///
    /// [`VmError::ModuleNotFound`] when nothing is published at the id;
    /// [`VmError::Decode`] on corrupt stored bytes.
    pub fn load_module(&mut self, id: &ModuleId) -> Result<CompiledModule, VmError> {
        let path = AccessPath::code(id.address, id.name.clone());
        let bytes = self
            .read(&path)?
            .ok_or_else(|| VmError::ModuleNotFound(id.clone()))?;
        bincode::deserialize(&bytes)
            .map_err(|e| VmError::decode(format!("stored module {id}: {e}")))
    }

    /// Uncharged read through pending writes then the backing store.
    /// Engine bookkeeping only (size deltas, existence probes are charged
    /// by their callers through [`Session::read`]).
    fn peek(&self, path: &AccessPath) -> Result<Option<Vec<u8>>, VmError> {
        if let Some(op) = self.writes.pending(path) {
            return Ok(match op {
                Op::Set(value) => Some(value.clone()),
                Op::Delete => None,
            });
        }
        Ok(self.storage.get(&path.to_key())?)
    }

    /// Closes the session, releasing its outputs.
    #[must_use]
    pub fn finish(self) -> SessionOutput {
        let size_deltas = self
            .size_deltas
            .into_iter()
            .filter(|(_, delta)| *delta != 0)
            .map(|(address, delta)| SizeDelta {
                address,
                amount: delta.unsigned_abs(),
                is_decrease: delta < 0,
            })
            .collect();
        SessionOutput {
            write_set: self.writes,
            events: self.events,
            size_deltas,
            gas_used: self.meter.gas_used(),
        }
    }
}

/// Everything a finished session hands back to its caller.
#[derive(Debug)]
pub struct SessionOutput {
    /// Buffered mutations, unapplied.
    pub write_set: WriteSet,
    /// Events in emission order.
    pub events: Vec<ContractEvent>,
    /// Per-account storage footprint changes.
    pub size_deltas: Vec<SizeDelta>,
    /// Gas consumed by the session.
    pub gas_used: u64,
}

// =============================================================================
// TESTS
// =============================================================================
