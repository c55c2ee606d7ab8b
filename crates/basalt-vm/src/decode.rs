//! # Binary Decoders
//!
//! Decoders from the engine's binary representation into JSON for
//! explorers and host tooling. Module and script decoding are pure;
//! resource decoding resolves the struct layout from storage. None of
//! these charge gas.

use crate::backend::Storage;
use crate::errors::VmError;
use basalt_types::{
    AccessPath, Bytecode, CompiledModule, CompiledScript, StructTag, Value,
};
use serde_json::{json, Value as Json};

/// Decodes bincode module bytes into a JSON description.
///
/// # Errors
///
/// [`VmError::Decode`] on truncated or corrupt input.
pub fn decode_module_bytes(module_bytes: &[u8]) -> Result<Vec<u8>, VmError> {
    let module: CompiledModule = bincode::deserialize(module_bytes)
        .map_err(|e| VmError::decode(format!("module bytes: {e}")))?;
    let doc = module_to_json(&module);
    to_json_vec(&doc)
}

/// Decodes bincode script bytes into a JSON description.
///
/// # Errors
///
/// [`VmError::Decode`] on truncated or corrupt input.
pub fn decode_script_bytes(script_bytes: &[u8]) -> Result<Vec<u8>, VmError> {
    let script: CompiledScript = bincode::deserialize(script_bytes)
        .map_err(|e| VmError::decode(format!("script bytes: {e}")))?;
    let doc = json!({
        "params": script.params.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "ret": script.ret.map(|t| t.to_string()),
        "code": disassemble(&script.code),
    });
    to_json_vec(&doc)
}

/// Decodes stored resource bytes into a JSON object, resolving the field
/// layout from the defining module in storage.
///
/// # Errors
///
/// [`VmError::Validation`] on a malformed tag or unknown struct,
/// [`VmError::ModuleNotFound`] when the defining module is not published,
/// [`VmError::Decode`] on corrupt bytes or a layout mismatch.
pub fn decode_resource<S: Storage>(
    storage: &S,
    struct_tag: &str,
    resource_bytes: &[u8],
) -> Result<Vec<u8>, VmError> {
    let tag = StructTag::parse(struct_tag).map_err(|e| VmError::validation(e.to_string()))?;
    let module_id = tag.module_id();

    let path = AccessPath::code(tag.address, tag.module.clone());
    let module_bytes = storage
        .get(&path.to_key())?
        .ok_or_else(|| VmError::ModuleNotFound(module_id.clone()))?;
    let module: CompiledModule = bincode::deserialize(&module_bytes)
        .map_err(|e| VmError::decode(format!("stored module {module_id}: {e}")))?;

    let def = module.struct_def(&tag.name).ok_or_else(|| {
        VmError::validation(format!("struct {} not defined in {}", tag.name, module_id))
    })?;

    let fields: Vec<Value> = bincode::deserialize(resource_bytes)
        .map_err(|e| VmError::decode(format!("resource bytes: {e}")))?;
    if fields.len() != def.fields.len() {
        return Err(VmError::decode(format!(
            "resource for {tag}: expected {} fields, found {}",
            def.fields.len(),
            fields.len()
        )));
    }

    let mut data = serde_json::Map::new();
    for (field, value) in def.fields.iter().zip(&fields) {
        if !value.matches(field.ty) {
            return Err(VmError::decode(format!(
                "resource for {tag}: field {} expected {}, found {}",
                field.name,
                field.ty,
                value.type_tag()
            )));
        }
        data.insert(field.name.to_string(), value_to_json(value));
    }

    let doc = json!({
        "type": tag.to_string(),
        "data": data,
    });
    to_json_vec(&doc)
}

fn module_to_json(module: &CompiledModule) -> Json {
    json!({
        "name": module.name.to_string(),
        "structs": module.structs.iter().map(|def| {
            json!({
                "name": def.name.to_string(),
                "fields": def.fields.iter().map(|field| {
                    json!({
                        "name": field.name.to_string(),
                        "type": field.ty.to_string(),
                    })
                }).collect::<Vec<_>>(),
            })
        }).collect::<Vec<_>>(),
        "functions": module.functions.iter().map(|def| {
            json!({
                "name": def.name.to_string(),
                "is_entry": def.is_entry,
                "params": def.params.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "ret": def.ret.map(|t| t.to_string()),
                "code": disassemble(&def.code),
            })
        }).collect::<Vec<_>>(),
    })
}

/// Renders bytecode as one mnemonic line per instruction.
fn disassemble(code: &[Bytecode]) -> Vec<String> {
    code.iter().map(render_instruction).collect()
}

fn render_instruction(instruction: &Bytecode) -> String {
    let mnemonic = instruction.mnemonic();
    match instruction {
        Bytecode::PushBool(v) => format!("{mnemonic} {v}"),
        Bytecode::PushU64(v) => format!("{mnemonic} {v}"),
        Bytecode::PushU128(v) => format!("{mnemonic} {v}"),
        Bytecode::PushAddress(v) => format!("{mnemonic} {}", v.to_short_hex()),
        Bytecode::PushBytes(v) => format!("{mnemonic} 0x{}", hex::encode(v)),
        Bytecode::CopyArg(i) => format!("{mnemonic} {i}"),
        Bytecode::Branch(t) | Bytecode::BranchIfFalse(t) => format!("{mnemonic} {t}"),
        Bytecode::MoveTo(i) | Bytecode::MoveFrom(i) | Bytecode::Exists(i) => {
            format!("{mnemonic} {i}")
        }
        _ => mnemonic.to_string(),
    }
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Bool(v) => json!(v),
        Value::U64(v) => json!(v),
        // u128 exceeds JSON number precision; render as a string
        Value::U128(v) => json!(v.to_string()),
        Value::Address(v) => json!(v.to_short_hex()),
        Value::Bytes(v) => json!(format!("0x{}", hex::encode(v))),
    }
}

fn to_json_vec(doc: &Json) -> Result<Vec<u8>, VmError> {
    serde_json::to_vec(doc).map_err(|e| VmError::Internal(format!("json encode: {e}")))
}

// =============================================================================
// TESTS
// =============================================================================
