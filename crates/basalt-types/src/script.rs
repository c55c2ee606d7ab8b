//! # Compiled Scripts
//!
//! A script is a single anonymous function executed without being
//! published. It shares the module bytecode and may use the raw storage
//! and resource ops only through modules it calls into: scripts define no
//! structs, so resource opcodes are rejected at validation time.

use crate::module::{Bytecode, TypeTag};
use serde::{Deserialize, Serialize};

/// A compiled script unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledScript {
    /// Parameter types. Arguments are bound by position.
    pub params: Vec<TypeTag>,
    /// Return type, if any.
    pub ret: Option<TypeTag>,
    /// Script body.
    pub code: Vec<Bytecode>,
}
