//! # Messages
//!
//! The payloads the host hands to the execution entry points: an entry
//! function call against a published module, or a standalone script unit
//! with its arguments. Both cross the boundary bincode-encoded; the
//! session seed and sender travel as separate call parameters.

use crate::module::{Identifier, ModuleId};
use crate::script::CompiledScript;
use crate::value::Value;
use serde::{Deserialize, Serialize};

/// A call to an entry function of a published module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFunction {
    /// Target module.
    pub module: ModuleId,
    /// Entry function name.
    pub function: Identifier,
    /// Positional arguments.
    pub args: Vec<Value>,
}

impl EntryFunction {
    /// Creates an entry function call.
    #[must_use]
    pub fn new(module: ModuleId, function: Identifier, args: Vec<Value>) -> Self {
        Self {
            module,
            function,
            args,
        }
    }
}

/// A script execution request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptMessage {
    /// The script unit to run.
    pub script: CompiledScript,
    /// Positional arguments.
    pub args: Vec<Value>,
}
