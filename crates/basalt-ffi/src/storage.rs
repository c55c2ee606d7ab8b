//! # Host-Backed Storage
//!
//! [`GoStorage`] is the engine-facing face of the [`Db`] capability: it
//! implements the engine's [`Storage`] trait by invoking the host's
//! callback table. Every callback invocation follows the same ownership
//! drill: output buffers start absent, whatever the host writes into
//! them is consumed on every path, and the status code plus message
//! buffer convert into a backend error.

use crate::db::Db;
use crate::error::GoError;
use crate::memory::{U8SliceView, UnmanagedVector};
use basalt_vm::backend::Storage;
use basalt_vm::errors::BackendResult;

/// Storage backed by the host's Db callbacks.
pub struct GoStorage {
    db: Db,
}

impl GoStorage {
    /// Wraps a Db capability for the duration of one call.
    #[must_use]
    pub fn new(db: Db) -> Self {
        GoStorage { db }
    }
}

impl Storage for GoStorage {
    fn get(&self, key: &[u8]) -> BackendResult<Option<Vec<u8>>> {
        let mut output = UnmanagedVector::default();
        let mut error_msg = UnmanagedVector::default();
        let go_error: GoError = (self.db.vtable.read_db)(
            self.db.state,
            U8SliceView::new(Some(key)),
            &mut output as *mut UnmanagedVector,
            &mut error_msg as *mut UnmanagedVector,
        )
        .into();
        // consume before the error check so the buffer is released on
        // every path
        let output = output.consume();

        let default = || {
            format!(
                "failed to read key in db: {}",
                String::from_utf8_lossy(key)
            )
        };
        unsafe { go_error.into_result(error_msg, default)? };

        // an absent output is a missing key, not a failure
        Ok(output)
    }

    fn set(&mut self, key: &[u8], value: &[u8]) -> BackendResult<()> {
        let mut error_msg = UnmanagedVector::default();
        let go_error: GoError = (self.db.vtable.write_db)(
            self.db.state,
            U8SliceView::new(Some(key)),
            U8SliceView::new(Some(value)),
            &mut error_msg as *mut UnmanagedVector,
        )
        .into();

        let default = || {
            format!(
                "failed to set key in db: {}",
                String::from_utf8_lossy(key)
            )
        };
        unsafe { go_error.into_result(error_msg, default) }
    }

    fn remove(&mut self, key: &[u8]) -> BackendResult<()> {
        let mut error_msg = UnmanagedVector::default();
        let go_error: GoError = (self.db.vtable.remove_db)(
            self.db.state,
            U8SliceView::new(Some(key)),
            &mut error_msg as *mut UnmanagedVector,
        )
        .into();

        let default = || {
            format!(
                "failed to delete key in db: {}",
                String::from_utf8_lossy(key)
            )
        };
        unsafe { go_error.into_result(error_msg, default) }
    }
}
