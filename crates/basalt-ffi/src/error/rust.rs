//! Entry-point errors and the (errno, error buffer) reporting helpers.
//!
//! Every failure inside an entry point (engine errors, backend errors,
//! caught panics, bad arguments) is translated here into a status code
//! plus a message buffer. Nothing ever unwinds across the boundary.

use crate::memory::UnmanagedVector;
use basalt_vm::errors::VmError;
use errno::{set_errno, Errno};
use thiserror::Error;

/// What an entry point reports back to the host.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RustError {
    /// UTF-8 bytes could not be decoded into a string.
    #[error("cannot decode UTF8 bytes into string: {msg}")]
    InvalidUtf8 {
        /// Decode failure description.
        msg: String,
    },

    /// The gas budget was exhausted, by the interpreter or by a host
    /// callback. Reported with its own errno value so the host can bill
    /// exhaustion differently from failure.
    #[error("ran out of gas")]
    OutOfGas {},

    /// A panic was caught at the boundary.
    #[error("caught panic")]
    Panic {},

    /// A required argument was nil.
    #[error("null/nil argument: {name}")]
    UnsetArg {
        /// Parameter name.
        name: String,
    },

    /// An argument was present but malformed.
    #[error("invalid argument: {msg}")]
    InvalidArgument {
        /// What was wrong with it.
        msg: String,
    },

    /// The engine failed: decode, validation, or execution.
    #[error("vm error: {msg}")]
    VmError {
        /// Engine failure description.
        msg: String,
    },

    /// A host callback failed and the failure surfaced through the
    /// engine.
    #[error("failure occurred from backend: {msg}")]
    BackendFailure {
        /// Callback failure description.
        msg: String,
    },
}

impl RustError {
    /// Shorthand for [`RustError::InvalidUtf8`].
    pub fn invalid_utf8<S: ToString>(msg: S) -> Self {
        RustError::InvalidUtf8 {
            msg: msg.to_string(),
        }
    }

    /// Shorthand for [`RustError::OutOfGas`].
    #[must_use]
    pub fn out_of_gas() -> Self {
        RustError::OutOfGas {}
    }

    /// Shorthand for [`RustError::Panic`].
    #[must_use]
    pub fn panic() -> Self {
        RustError::Panic {}
    }

    /// Shorthand for [`RustError::UnsetArg`].
    pub fn unset_arg<T: Into<String>>(name: T) -> Self {
        RustError::UnsetArg { name: name.into() }
    }

    /// Shorthand for [`RustError::InvalidArgument`].
    pub fn invalid_argument<S: ToString>(msg: S) -> Self {
        RustError::InvalidArgument {
            msg: msg.to_string(),
        }
    }

    /// Shorthand for [`RustError::VmError`].
    pub fn vm_err<S: ToString>(msg: S) -> Self {
        RustError::VmError {
            msg: msg.to_string(),
        }
    }

    /// Shorthand for [`RustError::BackendFailure`].
    pub fn backend_failure<S: ToString>(msg: S) -> Self {
        RustError::BackendFailure {
            msg: msg.to_string(),
        }
    }
}

impl From<VmError> for RustError {
    fn from(source: VmError) -> Self {
        if source.is_out_of_gas() {
            return RustError::out_of_gas();
        }
        match source {
            VmError::Backend(backend) => RustError::backend_failure(backend),
            other => RustError::vm_err(other),
        }
    }
}

impl From<std::str::Utf8Error> for RustError {
    fn from(source: std::str::Utf8Error) -> Self {
        RustError::invalid_utf8(source)
    }
}

impl From<std::string::FromUtf8Error> for RustError {
    fn from(source: std::string::FromUtf8Error) -> Self {
        RustError::invalid_utf8(source)
    }
}

// =============================================================================
// ERRNO REPORTING
// =============================================================================

/// Top-level status values observed by the host via errno.
#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrnoValue {
    /// The call succeeded.
    Success = 0,
    /// The call failed; the error buffer describes why.
    Other = 1,
    /// The call ran out of budget. Distinguished so the host can apply a
    /// different billing/retry policy.
    OutOfGas = 2,
}

/// Resets errno to success.
pub fn clear_error() {
    set_errno(Errno(ErrnoValue::Success as i32));
}

/// Writes `err` into the error-message buffer and sets errno.
///
/// # Panics
///
/// Panics when the buffer already holds a message: error-message pointers
/// must not be reused across calls, and silently overwriting would leak
/// the previous allocation.
pub fn set_error(err: RustError, error_msg: Option<&mut UnmanagedVector>) {
    if let Some(error_msg) = error_msg {
        if error_msg.is_some() {
            panic!(
                "there is an old error message in the given pointer that has not been cleaned \
                 up; error message pointers should not be reused for multiple calls"
            )
        }
        let msg: Vec<u8> = err.to_string().into();
        *error_msg = UnmanagedVector::new(Some(msg));
    }
    // a nil error-message pointer loses the message but not the status

    let errno = match err {
        RustError::OutOfGas { .. } => ErrnoValue::OutOfGas,
        _ => ErrnoValue::Other,
    };
    set_errno(Errno(errno as i32));
}

/// Unwraps a binary result for return through an owned buffer.
///
/// On `Ok` the payload is returned and errno cleared; on `Err` an empty
/// payload is returned, the message buffer populated, and errno set.
pub fn handle_c_error_binary<T>(
    result: Result<T, RustError>,
    error_msg: Option<&mut UnmanagedVector>,
) -> Vec<u8>
where
    T: Into<Vec<u8>>,
{
    match result {
        Ok(value) => {
            clear_error();
            value.into()
        }
        Err(error) => {
            set_error(error, error_msg);
            Vec::new()
        }
    }
}

/// Unwraps a defaultable result, reporting errors like
/// [`handle_c_error_binary`].
pub fn handle_c_error_default<T>(
    result: Result<T, RustError>,
    error_msg: Option<&mut UnmanagedVector>,
) -> T
where
    T: Default,
{
    match result {
        Ok(value) => {
            clear_error();
            value
        }
        Err(error) => {
            set_error(error, error_msg);
            Default::default()
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
