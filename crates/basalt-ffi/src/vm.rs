//! # Entry-Point Glue
//!
//! The bodies behind the exported entry points: decode inputs, run the
//! engine against host-backed capabilities, apply the write set on
//! success, and serialize the result. Everything returns `RustError` so
//! the entry points can translate uniformly into (errno, error buffer).

use crate::api::GoApi;
use crate::db::Db;
use crate::error::RustError;
use crate::querier::GoQuerier;
use crate::result::{generate_result, to_vec};
use crate::storage::GoStorage;
use basalt_types::{AccountAddress, EntryFunction, ModuleBundle, ScriptMessage};
use basalt_vm::decode;
use basalt_vm::session::apply_write_set;
use basalt_vm::vm::{BasaltVm, VmConfig};
use tracing::debug;

/// Loads a genesis module bundle into the Db-backed state.
pub(crate) fn initialize_vm(db: Db, module_bundle: &[u8]) -> Result<Vec<u8>, RustError> {
    let mut storage = GoStorage::new(db);
    let bundle: ModuleBundle = bincode::deserialize(module_bundle)
        .map_err(|e| RustError::vm_err(format!("module bundle decode: {e}")))?;

    let vm = BasaltVm::new();
    let output = vm.initialize(&storage, bundle)?;
    apply_write_set(&mut storage, &output.write_set).map_err(RustError::backend_failure)?;
    debug!(writes = output.write_set.len(), "genesis applied");

    // empty marker result
    Ok(Vec::new())
}

/// Validates and stores one module under the sender's address.
pub(crate) fn publish_module(
    db: Db,
    sender: &[u8],
    module_bytes: &[u8],
    gas_limit: u64,
) -> Result<Vec<u8>, RustError> {
    let sender = parse_address(sender)?;
    let mut storage = GoStorage::new(db);

    let vm = BasaltVm::new();
    let output = vm.publish_module(&storage, sender, module_bytes, gas_limit)?;
    apply_write_set(&mut storage, &output.write_set).map_err(RustError::backend_failure)?;
    debug!(gas_used = output.gas_used, "module published");

    to_vec(&generate_result(output))
}

/// Executes an entry function of a published module.
pub(crate) fn execute_contract(
    db: Db,
    api: GoApi,
    querier: GoQuerier,
    gas_limit: u64,
    session_id: &[u8],
    sender: &[u8],
    message: &[u8],
) -> Result<Vec<u8>, RustError> {
    let sender = parse_address(sender)?;
    let entry: EntryFunction = bincode::deserialize(message)
        .map_err(|e| RustError::vm_err(format!("message decode: {e}")))?;
    let mut storage = GoStorage::new(db);

    let vm = BasaltVm::new();
    let output = vm.execute_entry(
        &storage, session_id, sender, &entry, &api, &querier, gas_limit,
    )?;
    apply_write_set(&mut storage, &output.write_set).map_err(RustError::backend_failure)?;
    debug!(gas_used = output.gas_used, events = output.events.len(), "contract executed");

    to_vec(&generate_result(output))
}

/// Executes an unpublished script.
pub(crate) fn execute_script(
    db: Db,
    api: GoApi,
    querier: GoQuerier,
    gas_limit: u64,
    session_id: &[u8],
    sender: &[u8],
    message: &[u8],
) -> Result<Vec<u8>, RustError> {
    let sender = parse_address(sender)?;
    let config = VmConfig::default();
    if message.len() > config.max_script_size {
        return Err(RustError::vm_err(format!(
            "script message of {} bytes exceeds limit {}",
            message.len(),
            config.max_script_size
        )));
    }
    let script: ScriptMessage = bincode::deserialize(message)
        .map_err(|e| RustError::vm_err(format!("message decode: {e}")))?;
    let mut storage = GoStorage::new(db);

    let vm = BasaltVm::with_config(config);
    let output = vm.execute_script(
        &storage, session_id, sender, &script, &api, &querier, gas_limit,
    )?;
    apply_write_set(&mut storage, &output.write_set).map_err(RustError::backend_failure)?;
    debug!(gas_used = output.gas_used, "script executed");

    to_vec(&generate_result(output))
}

/// Runs an entry function read-only and returns its bincode-encoded
/// value. The bank capability is never wired in, and no write set is
/// applied.
pub(crate) fn query_contract(
    db: Db,
    querier: GoQuerier,
    gas_limit: u64,
    message: &[u8],
) -> Result<Vec<u8>, RustError> {
    let entry: EntryFunction = bincode::deserialize(message)
        .map_err(|e| RustError::vm_err(format!("message decode: {e}")))?;
    let storage = GoStorage::new(db);

    let vm = BasaltVm::new();
    let output = vm.query_entry(&storage, &entry, &querier, gas_limit)?;
    let value = output
        .return_value
        .ok_or_else(|| RustError::vm_err("query produced no return value"))?;
    bincode::serialize(&value).map_err(|e| RustError::vm_err(format!("result encode: {e}")))
}

/// Decodes module bytes into JSON. Pure.
pub(crate) fn decode_module_bytes(module_bytes: &[u8]) -> Result<Vec<u8>, RustError> {
    Ok(decode::decode_module_bytes(module_bytes)?)
}

/// Decodes script bytes into JSON. Pure.
pub(crate) fn decode_script_bytes(script_bytes: &[u8]) -> Result<Vec<u8>, RustError> {
    Ok(decode::decode_script_bytes(script_bytes)?)
}

/// Decodes resource bytes into JSON, resolving the layout from the
/// Db-stored defining module.
pub(crate) fn decode_move_resource(
    db: Db,
    struct_tag: &[u8],
    resource_bytes: &[u8],
) -> Result<Vec<u8>, RustError> {
    let tag = std::str::from_utf8(struct_tag)?;
    let storage = GoStorage::new(db);
    Ok(decode::decode_resource(&storage, tag, resource_bytes)?)
}

fn parse_address(bytes: &[u8]) -> Result<AccountAddress, RustError> {
    AccountAddress::from_bytes(bytes).map_err(RustError::invalid_argument)
}
