//! # Error Types
//!
//! Two deliberately separate taxonomies:
//!
//! - [`BackendError`]: failures reported by the host's callbacks
//!   (storage, bank, query). These originate outside the engine.
//! - [`VmError`]: failures of the engine itself during decoding,
//!   validation, or execution.
//!
//! The host's billing logic distinguishes the two, so they are never
//! collapsed into one enum; a backend failure surfaces inside [`VmError`]
//! only through the explicit [`VmError::Backend`] variant.

use basalt_types::{ModuleId, StructTag, TypeTag};
use thiserror::Error;

// =============================================================================
// BACKEND ERRORS (host callbacks)
// =============================================================================

/// Result alias for host callback operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors reported by the host across the callback boundary.
///
/// The variants mirror the callback status codes: anything the host can
/// signal has a representation here, plus [`BackendError::Unknown`] for
/// codes the engine does not recognize.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The host callback panicked.
    #[error("panic in host callback")]
    Panic,

    /// The host rejected an argument the engine passed.
    #[error("bad argument passed to host callback")]
    BadArgument,

    /// The host's own gas bookkeeping ran out mid-callback.
    #[error("out of gas in host callback")]
    OutOfGas,

    /// The host failed to serialize data for the engine.
    #[error("host could not serialize response")]
    CannotSerialize,

    /// The callback ran, but the underlying host operation failed.
    #[error("host error: {msg}")]
    UserErr {
        /// Host-provided message.
        msg: String,
    },

    /// The host has not implemented this callback.
    #[error("host callback unimplemented: {msg}")]
    Unimplemented {
        /// Which callback was missing.
        msg: String,
    },

    /// Anything else, including unrecognized status codes.
    #[error("unknown host error: {msg}")]
    Unknown {
        /// Best-effort description.
        msg: String,
    },
}

impl BackendError {
    /// Shorthand for [`BackendError::UserErr`].
    pub fn user_err<S: ToString>(msg: S) -> Self {
        BackendError::UserErr {
            msg: msg.to_string(),
        }
    }

    /// Shorthand for [`BackendError::Unknown`].
    pub fn unknown<S: ToString>(msg: S) -> Self {
        BackendError::Unknown {
            msg: msg.to_string(),
        }
    }

    /// Shorthand for [`BackendError::Unimplemented`].
    pub fn unimplemented<S: ToString>(msg: S) -> Self {
        BackendError::Unimplemented {
            msg: msg.to_string(),
        }
    }
}

// =============================================================================
// VM ERRORS (engine)
// =============================================================================

/// Errors raised by the engine during decoding, validation, or execution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VmError {
    /// The gas budget is exhausted.
    #[error("out of gas")]
    OutOfGas,

    /// Operand stack grew past its limit.
    #[error("stack overflow")]
    StackOverflow,

    /// Pop from an empty operand stack.
    #[error("stack underflow")]
    StackUnderflow,

    /// A binary payload could not be decoded.
    #[error("decode failure: {msg}")]
    Decode {
        /// What failed to decode.
        msg: String,
    },

    /// A module or script failed validation.
    #[error("validation failure: {msg}")]
    Validation {
        /// Which rule was violated.
        msg: String,
    },

    /// Contract code aborted with a code.
    #[error("aborted: location={location}, code={code}")]
    Aborted {
        /// Module id (or `script`) that aborted.
        location: String,
        /// Abort code popped from the stack.
        code: u64,
    },

    /// A value had the wrong type for the operation.
    #[error("type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected type.
        expected: TypeTag,
        /// Actual type.
        got: TypeTag,
    },

    /// Checked arithmetic failed.
    #[error("arithmetic error: {msg}")]
    Arithmetic {
        /// Overflow or division by zero.
        msg: String,
    },

    /// A branch target is outside the code.
    #[error("invalid branch target {target} (code length {len})")]
    InvalidBranch {
        /// Requested instruction index.
        target: usize,
        /// Code length.
        len: usize,
    },

    /// No module published at the requested id.
    #[error("module not found: {0}")]
    ModuleNotFound(ModuleId),

    /// A module is already published at the requested id.
    #[error("module already published: {0}")]
    ModuleAlreadyExists(ModuleId),

    /// The requested function does not exist in the module.
    #[error("function not found: {module}::{function}")]
    FunctionNotFound {
        /// Module searched.
        module: ModuleId,
        /// Missing function name.
        function: String,
    },

    /// The requested function exists but is not an entry function.
    #[error("not an entry function: {module}::{function}")]
    NotAnEntryFunction {
        /// Module searched.
        module: ModuleId,
        /// Function name.
        function: String,
    },

    /// Resource publish over an existing resource.
    #[error("resource already exists: {0}")]
    ResourceAlreadyExists(StructTag),

    /// Resource read/remove of a missing resource.
    #[error("resource not found: {0}")]
    ResourceNotFound(StructTag),

    /// Mutation attempted inside a read-only session.
    #[error("write operation in read-only context")]
    WriteInReadOnlyContext,

    /// The operation requires a transaction sender.
    #[error("operation requires a sender")]
    SenderRequired,

    /// Execution finished without producing the declared return value.
    #[error("missing return value")]
    MissingReturnValue,

    /// A host callback failed.
    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),

    /// Engine invariant violation. Indicates a bug, not bad input.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VmError {
    /// Shorthand for [`VmError::Decode`].
    pub fn decode<S: ToString>(msg: S) -> Self {
        VmError::Decode {
            msg: msg.to_string(),
        }
    }

    /// Shorthand for [`VmError::Validation`].
    pub fn validation<S: ToString>(msg: S) -> Self {
        VmError::Validation {
            msg: msg.to_string(),
        }
    }

    /// Shorthand for [`VmError::Arithmetic`].
    pub fn arithmetic<S: ToString>(msg: S) -> Self {
        VmError::Arithmetic {
            msg: msg.to_string(),
        }
    }

    /// True when the error is gas exhaustion, from either the interpreter
    /// or a host callback.
    #[must_use]
    pub fn is_out_of_gas(&self) -> bool {
        matches!(
            self,
            VmError::OutOfGas | VmError::Backend(BackendError::OutOfGas)
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================
