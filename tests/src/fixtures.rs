//! # Test Fixtures
//!
//! Sample modules, scripts, and message encoders shared by the
//! integration suite.

use basalt_types::{
    AccountAddress, Bytecode, CompiledModule, CompiledScript, EntryFunction, FieldDef,
    FunctionDef, Identifier, ModuleBundle, ModuleId, ScriptMessage, StructDef, TypeTag, Value,
};

/// A deterministic non-framework sender.
pub fn sender() -> AccountAddress {
    AccountAddress::new([0x42; 32])
}

/// Identifier helper.
pub fn ident(name: &str) -> Identifier {
    Identifier::new(name).expect("fixture identifier")
}

/// A counter module: publishes a `Counter` resource, stores raw state,
/// emits events, transfers funds, and exposes a read-only view.
pub fn counter_module() -> CompiledModule {
    CompiledModule {
        name: ident("counter"),
        structs: vec![StructDef {
            name: ident("Counter"),
            fields: vec![FieldDef {
                name: ident("value"),
                ty: TypeTag::U64,
            }],
        }],
        functions: vec![
            // create(value): publish a Counter under the sender
            FunctionDef {
                name: ident("create"),
                is_entry: true,
                params: vec![TypeTag::U64],
                ret: None,
                code: vec![Bytecode::CopyArg(0), Bytecode::MoveTo(0), Bytecode::Ret],
            },
            // record(key, value): raw storage write plus an event
            FunctionDef {
                name: ident("record"),
                is_entry: true,
                params: vec![TypeTag::Bytes, TypeTag::Bytes],
                ret: None,
                code: vec![
                    Bytecode::CopyArg(0),
                    Bytecode::CopyArg(1),
                    Bytecode::StSet,
                    Bytecode::CopyArg(1),
                    Bytecode::Emit,
                    Bytecode::Ret,
                ],
            },
            // lookup(key): raw storage read, returns the found flag
            FunctionDef {
                name: ident("lookup"),
                is_entry: true,
                params: vec![TypeTag::Bytes],
                ret: Some(TypeTag::Bool),
                code: vec![
                    Bytecode::CopyArg(0),
                    Bytecode::StGet,
                    // found flag lands on top; Ret returns it
                    Bytecode::Ret,
                ],
            },
            // has_counter(addr): read-only resource probe
            FunctionDef {
                name: ident("has_counter"),
                is_entry: true,
                params: vec![TypeTag::Address],
                ret: Some(TypeTag::Bool),
                code: vec![Bytecode::CopyArg(0), Bytecode::Exists(0), Bytecode::Ret],
            },
            // pay(recipient, amount): bank transfer from the sender
            FunctionDef {
                name: ident("pay"),
                is_entry: true,
                params: vec![TypeTag::Address, TypeTag::U128],
                ret: None,
                code: vec![
                    Bytecode::CopyArg(0),
                    Bytecode::CopyArg(1),
                    Bytecode::Transfer,
                    Bytecode::Ret,
                ],
            },
            // probe(request): forward to the external querier
            FunctionDef {
                name: ident("probe"),
                is_entry: true,
                params: vec![TypeTag::Bytes],
                ret: Some(TypeTag::Bytes),
                code: vec![Bytecode::CopyArg(0), Bytecode::Query, Bytecode::Ret],
            },
            // spin(): loop forever: gas-bounded-termination fixture
            FunctionDef {
                name: ident("spin"),
                is_entry: true,
                params: vec![],
                ret: None,
                code: vec![Bytecode::Branch(0)],
            },
        ],
    }
}

/// Bincode-encoded counter module.
pub fn counter_module_bytes() -> Vec<u8> {
    bincode::serialize(&counter_module()).expect("fixture encode")
}

/// Bincode-encoded single-module genesis bundle.
pub fn genesis_bundle_bytes() -> Vec<u8> {
    bincode::serialize(&ModuleBundle::new(vec![counter_module()])).expect("fixture encode")
}

/// Module id of the counter module as published by `owner`.
pub fn counter_id(owner: AccountAddress) -> ModuleId {
    ModuleId::new(owner, ident("counter"))
}

/// Bincode-encoded entry-function message.
pub fn entry_message(owner: AccountAddress, function: &str, args: Vec<Value>) -> Vec<u8> {
    let entry = EntryFunction::new(counter_id(owner), ident(function), args);
    bincode::serialize(&entry).expect("fixture encode")
}

/// A script that multiplies its two arguments.
pub fn multiply_script_message(a: u64, b: u64) -> Vec<u8> {
    let message = ScriptMessage {
        script: CompiledScript {
            params: vec![TypeTag::U64, TypeTag::U64],
            ret: Some(TypeTag::U64),
            code: vec![
                Bytecode::CopyArg(0),
                Bytecode::CopyArg(1),
                Bytecode::Mul,
                Bytecode::Ret,
            ],
        },
        args: vec![Value::U64(a), Value::U64(b)],
    };
    bincode::serialize(&message).expect("fixture encode")
}

/// A script that queries external state and returns the response.
pub fn query_script_message(request: &[u8]) -> Vec<u8> {
    let message = ScriptMessage {
        script: CompiledScript {
            params: vec![TypeTag::Bytes],
            ret: Some(TypeTag::Bytes),
            code: vec![Bytecode::CopyArg(0), Bytecode::Query, Bytecode::Ret],
        },
        args: vec![Value::Bytes(request.to_vec())],
    };
    bincode::serialize(&message).expect("fixture encode")
}
