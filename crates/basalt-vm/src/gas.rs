//! # Gas Metering
//!
//! Cost table and the decrementing meter threaded through execution. Gas
//! is the boundary's only preemption mechanism: the interpreter charges
//! for its own work, sessions charge for storage traffic, and callback
//! invocations carry flat costs plus per-byte components. Exhaustion at
//! any point aborts the call.

use crate::errors::VmError;
use basalt_types::Bytecode;

// =============================================================================
// COST TABLE
// =============================================================================

/// Gas costs for engine operations.
pub mod costs {
    /// Cheap stack/constant instructions.
    pub const INSTR_SIMPLE: u64 = 2;
    /// Arithmetic and comparison instructions.
    pub const INSTR_ARITHMETIC: u64 = 3;
    /// Control-flow instructions.
    pub const INSTR_BRANCH: u64 = 5;
    /// Per-byte surcharge for byte-vector constants.
    pub const INSTR_BYTES_PER_BYTE: u64 = 1;

    /// Storage read, flat.
    pub const STORAGE_READ_BASE: u64 = 100;
    /// Storage read, per byte of the value.
    pub const STORAGE_READ_PER_BYTE: u64 = 1;
    /// Storage write, flat.
    pub const STORAGE_WRITE_BASE: u64 = 300;
    /// Storage write, per byte of the value.
    pub const STORAGE_WRITE_PER_BYTE: u64 = 3;
    /// Storage remove, flat.
    pub const STORAGE_REMOVE: u64 = 100;

    /// Event emission, flat.
    pub const EMIT_BASE: u64 = 375;
    /// Event emission, per byte of payload.
    pub const EMIT_PER_BYTE: u64 = 8;

    /// Bank transfer callback.
    pub const TRANSFER: u64 = 9_000;
    /// External query callback, flat.
    pub const QUERY_BASE: u64 = 700;
    /// External query callback, per byte of request.
    pub const QUERY_PER_BYTE: u64 = 3;

    /// Module publication, flat.
    pub const PUBLISH_BASE: u64 = 1_500;
    /// Module publication, per byte of module bytes.
    pub const PUBLISH_PER_BYTE: u64 = 10;
}

/// Base cost of one instruction, excluding any storage/callback costs the
/// instruction incurs while executing.
#[must_use]
pub fn instruction_cost(instruction: &Bytecode) -> u64 {
    match instruction {
        Bytecode::PushBool(_)
        | Bytecode::PushU64(_)
        | Bytecode::PushU128(_)
        | Bytecode::PushAddress(_)
        | Bytecode::CopyArg(_)
        | Bytecode::Pop
        | Bytecode::Dup
        | Bytecode::Ret
        | Bytecode::Abort => costs::INSTR_SIMPLE,
        Bytecode::PushBytes(bytes) => {
            costs::INSTR_SIMPLE + bytes.len() as u64 * costs::INSTR_BYTES_PER_BYTE
        }
        Bytecode::Add
        | Bytecode::Sub
        | Bytecode::Mul
        | Bytecode::Div
        | Bytecode::Mod
        | Bytecode::Eq
        | Bytecode::Lt
        | Bytecode::Not => costs::INSTR_ARITHMETIC,
        Bytecode::Branch(_) | Bytecode::BranchIfFalse(_) => costs::INSTR_BRANCH,
        // Storage, resource, and callback instructions are charged their
        // traffic costs by the session; the base here covers dispatch.
        Bytecode::StGet
        | Bytecode::StSet
        | Bytecode::StRemove
        | Bytecode::MoveTo(_)
        | Bytecode::MoveFrom(_)
        | Bytecode::Exists(_)
        | Bytecode::Emit
        | Bytecode::Transfer
        | Bytecode::Query => costs::INSTR_SIMPLE,
    }
}

// =============================================================================
// GAS METER
// =============================================================================

/// A decrementing gas counter.
#[derive(Debug, Clone)]
pub struct GasMeter {
    limit: u64,
    remaining: u64,
    metered: bool,
}

impl GasMeter {
    /// Creates a meter with the given budget.
    #[must_use]
    pub fn new(limit: u64) -> Self {
        Self {
            limit,
            remaining: limit,
            metered: true,
        }
    }

    /// Creates a meter that never exhausts. Used for genesis
    /// initialization and the gas-free decode operations.
    #[must_use]
    pub fn unmetered() -> Self {
        Self {
            limit: 0,
            remaining: 0,
            metered: false,
        }
    }

    /// Deducts `amount` from the budget.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::OutOfGas`] when the budget cannot cover the
    /// charge. The remaining budget drops to zero in that case, so
    /// [`GasMeter::gas_used`] reports the full limit.
    pub fn charge(&mut self, amount: u64) -> Result<(), VmError> {
        if !self.metered {
            return Ok(());
        }
        match self.remaining.checked_sub(amount) {
            Some(rest) => {
                self.remaining = rest;
                Ok(())
            }
            None => {
                self.remaining = 0;
                Err(VmError::OutOfGas)
            }
        }
    }

    /// Gas remaining in the budget.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Gas consumed so far.
    #[must_use]
    pub fn gas_used(&self) -> u64 {
        if self.metered {
            self.limit - self.remaining
        } else {
            0
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
