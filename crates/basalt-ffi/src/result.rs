//! # Execution Results
//!
//! The JSON result document returned from the execution entry points:
//! status, events, per-account size deltas, and gas used. Queries instead
//! return their single value bincode-encoded; decoding entry points
//! return their own JSON documents.

use crate::error::RustError;
use basalt_vm::session::{ContractEvent, SizeDelta};
use basalt_vm::vm::ExecutionOutput;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// The serialized outcome of a successful execution.
pub struct ExecutionResult {
    status: String,
    events: Vec<ContractEvent>,
    size_deltas: Vec<SizeDelta>,
    gas_used: u64,
}

impl Serialize for ExecutionResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("ExecutionResult", 4)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("events", &self.events)?;
        state.serialize_field("size_deltas", &self.size_deltas)?;
        state.serialize_field("gas_used", &self.gas_used)?;
        state.end()
    }
}

/// Builds the result document for an executed (non-query) operation.
#[must_use]
pub fn generate_result(output: ExecutionOutput) -> ExecutionResult {
    ExecutionResult {
        status: "executed".to_string(),
        events: output.events,
        size_deltas: output.size_deltas,
        gas_used: output.gas_used,
    }
}

/// Serializes a result document to JSON bytes.
///
/// # Errors
///
/// Returns a [`RustError::VmError`] when serialization fails; with these
/// types that indicates an engine bug rather than bad input.
pub fn to_vec<T>(data: &T) -> Result<Vec<u8>, RustError>
where
    T: Serialize + ?Sized,
{
    serde_json::to_vec(data).map_err(|e| RustError::vm_err(format!("result serialize: {e}")))
}

// =============================================================================
// TESTS
// =============================================================================
