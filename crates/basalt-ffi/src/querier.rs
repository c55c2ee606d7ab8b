//! # Query Capability
//!
//! The host's external query router. Request and response payloads are
//! opaque to the engine; the host defines their formats.

use crate::error::GoError;
use crate::memory::{U8SliceView, UnmanagedVector};
use basalt_vm::backend::Querier;
use basalt_vm::errors::BackendResult;

/// Opaque host-side querier state. Only ever handled by pointer.
#[repr(C)]
#[allow(non_camel_case_types)]
pub struct querier_t {
    _private: [u8; 0],
}

/// Query callbacks.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct GoQuerierVtable {
    /// Routes an opaque request to the host and writes the response into
    /// the result output.
    pub query_external: extern "C" fn(
        *const querier_t,
        U8SliceView,          // request
        *mut UnmanagedVector, // result output
        *mut UnmanagedVector, // error message output
    ) -> i32,
}

/// The query capability passed by value into execution entry points.
#[repr(C)]
pub struct GoQuerier {
    /// Host-owned state, outliving the call.
    pub state: *const querier_t,
    /// Callback table.
    pub vtable: GoQuerierVtable,
}

// Immutable function-pointer table plus host-kept state; see Db.
unsafe impl Send for GoQuerier {}

impl Querier for GoQuerier {
    fn query(&self, request: &[u8]) -> BackendResult<Vec<u8>> {
        let mut output = UnmanagedVector::default();
        let mut error_msg = UnmanagedVector::default();
        let go_error: GoError = (self.vtable.query_external)(
            self.state,
            U8SliceView::new(Some(request)),
            &mut output as *mut UnmanagedVector,
            &mut error_msg as *mut UnmanagedVector,
        )
        .into();
        // consume the output unconditionally so its ownership is
        // discharged on the error path too
        let output = output.consume();

        let default = || "failed to query external state".to_string();
        unsafe { go_error.into_result(error_msg, default)? };

        Ok(output.unwrap_or_default())
    }
}
