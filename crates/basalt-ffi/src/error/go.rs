//! Status codes returned by host callbacks, and their conversion into the
//! engine's backend error taxonomy.

use crate::memory::UnmanagedVector;
use basalt_vm::errors::BackendError;

/// The status a host callback returns.
///
/// The host writes a plain `i32` across the boundary; conversion through
/// `From<i32>` maps every unrecognized value to [`GoError::Other`] rather
/// than trusting the input.
#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GoError {
    /// Success.
    None = 0,
    /// The host callback panicked.
    Panic = 1,
    /// The host received a bad argument from the engine.
    BadArgument = 2,
    /// The host's own gas bookkeeping ran out (e.g. its store's gas
    /// meter).
    OutOfGas = 3,
    /// The host failed to serialize its response.
    CannotSerialize = 4,
    /// The callback ran but the underlying operation failed; the message
    /// buffer describes why.
    User = 5,
    /// The host has not implemented this callback.
    Unimplemented = 6,
    /// Fallback for status codes the engine does not recognize. Never
    /// produced deliberately by a well-behaved host.
    Other = -1,
}

impl From<i32> for GoError {
    fn from(n: i32) -> Self {
        match n {
            0 => GoError::None,
            1 => GoError::Panic,
            2 => GoError::BadArgument,
            3 => GoError::OutOfGas,
            4 => GoError::CannotSerialize,
            5 => GoError::User,
            6 => GoError::Unimplemented,
            _ => GoError::Other,
        }
    }
}

impl GoError {
    /// Converts the status plus its error-message buffer into a backend
    /// result, consuming the buffer exactly once on every path.
    ///
    /// `default` supplies the message when the host did not populate the
    /// buffer; the buffer's contents are only read for the statuses that
    /// carry a message ([`GoError::User`] and [`GoError::Other`]).
    ///
    /// # Safety
    ///
    /// `error_msg` must be an initialized buffer the caller owns,
    /// normally the output parameter the callback just wrote. It is
    /// consumed here; the caller must not touch it again.
    pub unsafe fn into_result<F>(
        self,
        error_msg: UnmanagedVector,
        default: F,
    ) -> Result<(), BackendError>
    where
        F: FnOnce() -> String,
    {
        // Consume unconditionally: the buffer's ownership obligation is
        // discharged here no matter which branch runs.
        let msg: Option<String> = error_msg
            .consume()
            .map(|msg| String::from_utf8_lossy(&msg).into_owned());

        match self {
            GoError::None => Ok(()),
            GoError::Panic => Err(BackendError::Panic),
            GoError::BadArgument => Err(BackendError::BadArgument),
            GoError::OutOfGas => Err(BackendError::OutOfGas),
            GoError::CannotSerialize => Err(BackendError::CannotSerialize),
            GoError::Unimplemented => Err(BackendError::unimplemented(
                msg.unwrap_or_else(default),
            )),
            GoError::User => Err(BackendError::UserErr {
                msg: msg.unwrap_or_else(default),
            }),
            GoError::Other => Err(BackendError::Unknown {
                msg: msg.unwrap_or_else(default),
            }),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
