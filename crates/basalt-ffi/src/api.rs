//! # Bank Capability
//!
//! The host's account/bank handle. Transfer amounts cross the boundary as
//! a 16-byte little-endian u128 view, matching the engine's widest
//! integer type.

use crate::error::GoError;
use crate::memory::{U8SliceView, UnmanagedVector};
use basalt_types::AccountAddress;
use basalt_vm::backend::BankApi;
use basalt_vm::errors::BackendResult;

/// Opaque host-side bank state. Only ever handled by pointer.
#[repr(C)]
#[allow(non_camel_case_types)]
pub struct api_t {
    _private: [u8; 0],
}

/// Bank callbacks.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct GoApiVtable {
    /// Moves funds between accounts. No result buffer: success carries no
    /// payload, failure populates the error message output.
    pub bank_transfer: extern "C" fn(
        *const api_t,
        U8SliceView,          // sender address (32 bytes)
        U8SliceView,          // recipient address (32 bytes)
        U8SliceView,          // amount, 16-byte little-endian u128
        *mut UnmanagedVector, // error message output
    ) -> i32,
}

/// The bank capability passed by value into execution entry points.
#[repr(C)]
pub struct GoApi {
    /// Host-owned state, outliving the call.
    pub state: *const api_t,
    /// Callback table.
    pub vtable: GoApiVtable,
}

// Immutable function-pointer table plus host-kept state; see Db.
unsafe impl Send for GoApi {}

impl BankApi for GoApi {
    fn transfer(
        &self,
        sender: AccountAddress,
        recipient: AccountAddress,
        amount: u128,
    ) -> BackendResult<()> {
        let amount_bytes = amount.to_le_bytes();
        let mut error_msg = UnmanagedVector::default();
        let go_error: GoError = (self.vtable.bank_transfer)(
            self.state,
            U8SliceView::new(Some(sender.as_bytes())),
            U8SliceView::new(Some(recipient.as_bytes())),
            U8SliceView::new(Some(&amount_bytes)),
            &mut error_msg as *mut UnmanagedVector,
        )
        .into();

        // reading the buffer is how the Unknown/User messages surface
        let default = || format!("failed to transfer {amount} from {sender} to {recipient}");
        unsafe { go_error.into_result(error_msg, default) }
    }
}
