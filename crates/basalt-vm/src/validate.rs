//! # Module and Script Validation
//!
//! Structural checks run before anything is published or executed. After
//! validation, the interpreter can treat argument indices, branch
//! targets, and struct indices as trusted (it still defends against them
//! as internal errors).

use crate::errors::VmError;
use basalt_types::{Bytecode, CompiledModule, CompiledScript, FunctionDef, Identifier, StructDef};
use std::collections::BTreeSet;

/// Validates a module before publication.
///
/// # Errors
///
/// Returns [`VmError::Validation`] describing the first violated rule.
pub fn validate_module(module: &CompiledModule) -> Result<(), VmError> {
    check_identifier("module name", &module.name)?;

    let mut struct_names = BTreeSet::new();
    for def in &module.structs {
        check_identifier("struct name", &def.name)?;
        if !struct_names.insert(def.name.clone()) {
            return Err(VmError::validation(format!(
                "duplicate struct {} in module {}",
                def.name, module.name
            )));
        }
        check_struct(def)?;
    }

    let mut function_names = BTreeSet::new();
    for def in &module.functions {
        check_identifier("function name", &def.name)?;
        if !function_names.insert(def.name.clone()) {
            return Err(VmError::validation(format!(
                "duplicate function {} in module {}",
                def.name, module.name
            )));
        }
        check_function(def, module.structs.len())?;
    }

    Ok(())
}

/// Validates a script unit before execution.
///
/// Scripts have no module namespace: storage and resource instructions
/// are rejected outright.
///
/// # Errors
///
/// Returns [`VmError::Validation`] describing the first violated rule.
pub fn validate_script(script: &CompiledScript) -> Result<(), VmError> {
    for instruction in &script.code {
        if matches!(
            instruction,
            Bytecode::StGet
                | Bytecode::StSet
                | Bytecode::StRemove
                | Bytecode::MoveTo(_)
                | Bytecode::MoveFrom(_)
                | Bytecode::Exists(_)
        ) {
            return Err(VmError::validation(format!(
                "instruction {} is not allowed in scripts",
                instruction.mnemonic()
            )));
        }
    }
    check_code("script", &script.code, script.params.len(), 0)
}

fn check_struct(def: &StructDef) -> Result<(), VmError> {
    let mut field_names = BTreeSet::new();
    for field in &def.fields {
        check_identifier("field name", &field.name)?;
        if !field_names.insert(field.name.clone()) {
            return Err(VmError::validation(format!(
                "duplicate field {} in struct {}",
                field.name, def.name
            )));
        }
    }
    Ok(())
}

fn check_function(def: &FunctionDef, struct_count: usize) -> Result<(), VmError> {
    check_code(def.name.as_str(), &def.code, def.params.len(), struct_count)
}

fn check_code(
    location: &str,
    code: &[Bytecode],
    param_count: usize,
    struct_count: usize,
) -> Result<(), VmError> {
    if code.is_empty() {
        return Err(VmError::validation(format!("{location}: empty code")));
    }
    for (offset, instruction) in code.iter().enumerate() {
        match instruction {
            Bytecode::CopyArg(index) => {
                if *index as usize >= param_count {
                    return Err(VmError::validation(format!(
                        "{location}: copy_arg {index} at offset {offset} exceeds {param_count} parameters"
                    )));
                }
            }
            Bytecode::Branch(target) | Bytecode::BranchIfFalse(target) => {
                if *target as usize >= code.len() {
                    return Err(VmError::validation(format!(
                        "{location}: branch target {target} at offset {offset} outside code of length {}",
                        code.len()
                    )));
                }
            }
            Bytecode::MoveTo(index) | Bytecode::MoveFrom(index) | Bytecode::Exists(index) => {
                if *index as usize >= struct_count {
                    return Err(VmError::validation(format!(
                        "{location}: struct index {index} at offset {offset} exceeds {struct_count} structs"
                    )));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// Identifiers arrive through deserialization, which bypasses the
/// [`Identifier::new`] constructor; re-check the shape here.
fn check_identifier(what: &str, identifier: &Identifier) -> Result<(), VmError> {
    if Identifier::is_valid(identifier.as_str()) {
        Ok(())
    } else {
        Err(VmError::validation(format!(
            "invalid {what}: {:?}",
            identifier.as_str()
        )))
    }
}

// =============================================================================
// TESTS
// =============================================================================
