//! # Basalt Types
//!
//! Shared value objects and wire structures for the Basalt VM.
//!
//! Everything in this crate is plain data: addresses, module and script
//! definitions, runtime values, messages, and the access paths used to key
//! backend storage. The binary wire format for all of it is bincode; the
//! engine and the FFI boundary both speak these types.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod access_path;
pub mod address;
pub mod message;
pub mod module;
pub mod script;
pub mod value;

pub use access_path::AccessPath;
pub use address::{AccountAddress, AddressParseError};
pub use message::{EntryFunction, ScriptMessage};
pub use module::{
    Bytecode, CompiledModule, FieldDef, FunctionDef, Identifier, ModuleBundle, ModuleId, StructDef,
    StructTag, TypeTag,
};
pub use script::CompiledScript;
pub use value::Value;
