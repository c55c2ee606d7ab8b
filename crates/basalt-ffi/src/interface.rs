//! # Exported Entry Points
//!
//! The engine's C surface. Every entry point follows the same call
//! contract:
//!
//! - inputs arrive as borrowed views plus capability records, valid only
//!   for this call;
//! - the body runs under `catch_unwind`: no panic ever crosses the
//!   boundary;
//! - failures are reported through the error-message output buffer plus
//!   errno; the result buffer is returned owned, and the caller must
//!   destroy it through `destroy_unmanaged_vector`.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::api::GoApi;
use crate::db::Db;
use crate::error::{handle_c_error_binary, RustError};
use crate::memory::{ByteSliceView, UnmanagedVector};
use crate::querier::GoQuerier;
use crate::vm;

/// Loads a genesis module bundle into the Db-backed state.
///
/// Returns an empty marker result on success.
#[no_mangle]
pub extern "C" fn initialize(
    db: Db,
    _is_verbose: bool,
    errmsg: Option<&mut UnmanagedVector>,
    module_bundle: ByteSliceView,
) -> UnmanagedVector {
    let res = catch_unwind(AssertUnwindSafe(move || {
        let bundle = required(&module_bundle, "module_bundle")?;
        vm::initialize_vm(db, bundle)
    }))
    .unwrap_or_else(|_| Err(RustError::panic()));

    let ret = handle_c_error_binary(res, errmsg);
    UnmanagedVector::new(Some(ret))
}

/// Validates and stores a module under the sender's address, metered
/// against `gas_limit`.
#[no_mangle]
pub extern "C" fn publish_module(
    db: Db,
    _is_verbose: bool,
    gas_limit: u64,
    errmsg: Option<&mut UnmanagedVector>,
    sender: ByteSliceView,
    module_bytes: ByteSliceView,
) -> UnmanagedVector {
    let res = catch_unwind(AssertUnwindSafe(move || {
        let sender = required(&sender, "sender")?;
        let module_bytes = required(&module_bytes, "module_bytes")?;
        vm::publish_module(db, sender, module_bytes, gas_limit)
    }))
    .unwrap_or_else(|_| Err(RustError::panic()));

    let ret = handle_c_error_binary(res, errmsg);
    UnmanagedVector::new(Some(ret))
}

/// Executes an entry function of a published module within a session.
#[no_mangle]
pub extern "C" fn execute_contract(
    db: Db,
    api: GoApi,
    querier: GoQuerier,
    _is_verbose: bool,
    gas_limit: u64,
    errmsg: Option<&mut UnmanagedVector>,
    session_id: ByteSliceView,
    sender: ByteSliceView,
    message: ByteSliceView,
) -> UnmanagedVector {
    let res = catch_unwind(AssertUnwindSafe(move || {
        let session_id = required(&session_id, "session_id")?;
        let sender = required(&sender, "sender")?;
        let message = required(&message, "message")?;
        vm::execute_contract(db, api, querier, gas_limit, session_id, sender, message)
    }))
    .unwrap_or_else(|_| Err(RustError::panic()));

    let ret = handle_c_error_binary(res, errmsg);
    UnmanagedVector::new(Some(ret))
}

/// Executes an unpublished script within a session.
#[no_mangle]
pub extern "C" fn execute_script(
    db: Db,
    api: GoApi,
    querier: GoQuerier,
    _is_verbose: bool,
    gas_limit: u64,
    errmsg: Option<&mut UnmanagedVector>,
    session_id: ByteSliceView,
    sender: ByteSliceView,
    message: ByteSliceView,
) -> UnmanagedVector {
    let res = catch_unwind(AssertUnwindSafe(move || {
        let session_id = required(&session_id, "session_id")?;
        let sender = required(&sender, "sender")?;
        let message = required(&message, "message")?;
        vm::execute_script(db, api, querier, gas_limit, session_id, sender, message)
    }))
    .unwrap_or_else(|_| Err(RustError::panic()));

    let ret = handle_c_error_binary(res, errmsg);
    UnmanagedVector::new(Some(ret))
}

/// Runs an entry function read-only. The bank capability is accepted for
/// call-shape compatibility but never wired into the session; storage
/// mutation fails inside the engine.
#[no_mangle]
pub extern "C" fn query_contract(
    db: Db,
    _api: GoApi,
    querier: GoQuerier,
    _is_verbose: bool,
    gas_limit: u64,
    errmsg: Option<&mut UnmanagedVector>,
    message: ByteSliceView,
) -> UnmanagedVector {
    let res = catch_unwind(AssertUnwindSafe(move || {
        let message = required(&message, "message")?;
        vm::query_contract(db, querier, gas_limit, message)
    }))
    .unwrap_or_else(|_| Err(RustError::panic()));

    let ret = handle_c_error_binary(res, errmsg);
    UnmanagedVector::new(Some(ret))
}

/// Decodes module bytes into a JSON description. Pure; no gas.
#[no_mangle]
pub extern "C" fn decode_module_bytes(
    errmsg: Option<&mut UnmanagedVector>,
    module_bytes: ByteSliceView,
) -> UnmanagedVector {
    let res = catch_unwind(AssertUnwindSafe(move || {
        let module_bytes = required(&module_bytes, "module_bytes")?;
        vm::decode_module_bytes(module_bytes)
    }))
    .unwrap_or_else(|_| Err(RustError::panic()));

    let ret = handle_c_error_binary(res, errmsg);
    UnmanagedVector::new(Some(ret))
}

/// Decodes script bytes into a JSON description. Pure; no gas.
#[no_mangle]
pub extern "C" fn decode_script_bytes(
    errmsg: Option<&mut UnmanagedVector>,
    script_bytes: ByteSliceView,
) -> UnmanagedVector {
    let res = catch_unwind(AssertUnwindSafe(move || {
        let script_bytes = required(&script_bytes, "script_bytes")?;
        vm::decode_script_bytes(script_bytes)
    }))
    .unwrap_or_else(|_| Err(RustError::panic()));

    let ret = handle_c_error_binary(res, errmsg);
    UnmanagedVector::new(Some(ret))
}

/// Decodes resource bytes into a JSON object, resolving the struct layout
/// from the Db-stored defining module. No gas.
#[no_mangle]
pub extern "C" fn decode_move_resource(
    db: Db,
    errmsg: Option<&mut UnmanagedVector>,
    struct_tag: ByteSliceView,
    resource_bytes: ByteSliceView,
) -> UnmanagedVector {
    let res = catch_unwind(AssertUnwindSafe(move || {
        let struct_tag = required(&struct_tag, "struct_tag")?;
        let resource_bytes = required(&resource_bytes, "resource_bytes")?;
        vm::decode_move_resource(db, struct_tag, resource_bytes)
    }))
    .unwrap_or_else(|_| Err(RustError::panic()));

    let ret = handle_c_error_binary(res, errmsg);
    UnmanagedVector::new(Some(ret))
}

/// Reads a required view, rejecting the nil case.
fn required<'a>(view: &'a ByteSliceView, name: &str) -> Result<&'a [u8], RustError> {
    view.read().ok_or_else(|| RustError::unset_arg(name))
}
