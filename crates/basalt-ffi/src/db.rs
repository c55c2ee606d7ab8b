//! # Storage Capability
//!
//! The host's storage handle: an opaque state pointer plus a fixed table
//! of function pointers. The engine only ever touches the state through
//! the table, borrows the capability for a single call, and never retains
//! it. Callbacks run host code only and must not re-enter the engine's
//! entry points.

use crate::memory::{U8SliceView, UnmanagedVector};

/// Opaque host-side storage state. Only ever handled by pointer.
#[repr(C)]
#[allow(non_camel_case_types)]
pub struct db_t {
    _private: [u8; 0],
}

/// Storage callbacks.
///
/// Each returns a callback status code; the host is untrusted here, so
/// the raw `i32` is checked on conversion rather than assumed valid.
/// Result and error-message buffers are written through output pointers
/// that start absent; whatever lands in them is owned by the engine,
/// which must consume it.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct DbVtable {
    /// Reads the value at a key. A missing key is a success with an
    /// absent result, not an error.
    pub read_db: extern "C" fn(
        *mut db_t,
        U8SliceView,          // key
        *mut UnmanagedVector, // result output
        *mut UnmanagedVector, // error message output
    ) -> i32,
    /// Writes a value at a key.
    pub write_db: extern "C" fn(
        *mut db_t,
        U8SliceView,          // key
        U8SliceView,          // value
        *mut UnmanagedVector, // error message output
    ) -> i32,
    /// Removes the entry at a key.
    pub remove_db: extern "C" fn(
        *mut db_t,
        U8SliceView,          // key
        *mut UnmanagedVector, // error message output
    ) -> i32,
}

/// The storage capability passed by value into entry points.
#[repr(C)]
pub struct Db {
    /// Host-owned state, outliving the call.
    pub state: *mut db_t,
    /// Callback table.
    pub vtable: DbVtable,
}

// The host passes an immutable function-pointer table and a state pointer
// it keeps alive for the call; moving the capability between threads is
// sound even though raw pointers are not Send by default.
unsafe impl Send for Db {}
