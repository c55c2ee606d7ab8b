//! # Compiled Modules
//!
//! The engine's binary module representation: identifiers, type tags,
//! struct layouts, bytecode, and function definitions. Modules travel
//! across the boundary bincode-encoded; [`crate::script::CompiledScript`]
//! shares the same bytecode.

use crate::address::AccountAddress;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// A module, function, struct, or field name.
///
/// Valid identifiers are non-empty ASCII `[A-Za-z_][A-Za-z0-9_]*`.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Identifier(String);

impl Identifier {
    /// Creates an identifier, validating its shape.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError`] if the name is empty or contains
    /// characters outside `[A-Za-z0-9_]` (or starts with a digit).
    pub fn new<S: Into<String>>(name: S) -> Result<Self, IdentifierError> {
        let name = name.into();
        if Self::is_valid(&name) {
            Ok(Self(name))
        } else {
            Err(IdentifierError(name))
        }
    }

    /// Checks identifier validity without constructing one.
    #[must_use]
    pub fn is_valid(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error for malformed identifiers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid identifier: {0:?}")]
pub struct IdentifierError(pub String);

// =============================================================================
// MODULE IDS AND STRUCT TAGS
// =============================================================================

/// Fully qualified module id: publishing address plus module name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModuleId {
    /// Address the module is published under.
    pub address: AccountAddress,
    /// Module name.
    pub name: Identifier,
}

impl ModuleId {
    /// Creates a module id.
    #[must_use]
    pub fn new(address: AccountAddress, name: Identifier) -> Self {
        Self { address, name }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.address.to_short_hex(), self.name)
    }
}

impl fmt::Debug for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Fully qualified struct tag: `0xADDR::module::Struct`.
///
/// This is the key shape under which resources are stored, and the string
/// form accepted by the resource decoder.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StructTag {
    /// Address of the defining module.
    pub address: AccountAddress,
    /// Defining module name.
    pub module: Identifier,
    /// Struct name.
    pub name: Identifier,
}

impl StructTag {
    /// Creates a struct tag.
    #[must_use]
    pub fn new(address: AccountAddress, module: Identifier, name: Identifier) -> Self {
        Self {
            address,
            module,
            name,
        }
    }

    /// Returns the defining module's id.
    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        ModuleId::new(self.address, self.module.clone())
    }

    /// Parses the canonical `0xADDR::module::Struct` form.
    ///
    /// # Errors
    ///
    /// Returns [`StructTagParseError`] on any malformed segment.
    pub fn parse(s: &str) -> Result<Self, StructTagParseError> {
        let mut parts = s.split("::");
        let (addr, module, name) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(a), Some(m), Some(n), None) => (a, m, n),
            _ => return Err(StructTagParseError(s.to_string())),
        };
        let address: AccountAddress =
            addr.parse().map_err(|_| StructTagParseError(s.to_string()))?;
        let module =
            Identifier::new(module).map_err(|_| StructTagParseError(s.to_string()))?;
        let name = Identifier::new(name).map_err(|_| StructTagParseError(s.to_string()))?;
        Ok(Self::new(address, module, name))
    }
}

impl fmt::Display for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{}::{}",
            self.address.to_short_hex(),
            self.module,
            self.name
        )
    }
}

impl fmt::Debug for StructTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Error for malformed struct tags.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid struct tag: {0:?} (expected 0xADDR::module::Struct)")]
pub struct StructTagParseError(pub String);

// =============================================================================
// TYPE TAGS AND LAYOUTS
// =============================================================================

/// Runtime value types. Struct fields, function parameters, and return
/// values are all drawn from this set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeTag {
    /// Boolean.
    Bool,
    /// 64-bit unsigned integer.
    U64,
    /// 128-bit unsigned integer.
    U128,
    /// Account address.
    Address,
    /// Raw byte vector.
    Bytes,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeTag::Bool => "bool",
            TypeTag::U64 => "u64",
            TypeTag::U128 => "u128",
            TypeTag::Address => "address",
            TypeTag::Bytes => "bytes",
        };
        write!(f, "{name}")
    }
}

/// A named, typed struct field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name.
    pub name: Identifier,
    /// Field type.
    pub ty: TypeTag,
}

/// A struct (resource) layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructDef {
    /// Struct name.
    pub name: Identifier,
    /// Ordered fields. Resource bytes are the bincode encoding of one
    /// value per field in this order.
    pub fields: Vec<FieldDef>,
}

// =============================================================================
// BYTECODE
// =============================================================================

/// One instruction of the Basalt stack machine.
///
/// Branch targets are absolute instruction indices. Arithmetic is checked:
/// overflow and division by zero abort execution.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bytecode {
    /// Push a boolean constant.
    PushBool(bool),
    /// Push a u64 constant.
    PushU64(u64),
    /// Push a u128 constant.
    PushU128(u128),
    /// Push an address constant.
    PushAddress(AccountAddress),
    /// Push a byte-vector constant.
    PushBytes(Vec<u8>),
    /// Push a copy of the call argument at the given index.
    CopyArg(u8),
    /// Discard the top of the stack.
    Pop,
    /// Duplicate the top of the stack.
    Dup,
    /// Checked addition over two integers of the same width.
    Add,
    /// Checked subtraction.
    Sub,
    /// Checked multiplication.
    Mul,
    /// Checked division.
    Div,
    /// Checked remainder.
    Mod,
    /// Pop two values, push equality.
    Eq,
    /// Pop two integers of the same width, push `lhs < rhs`.
    Lt,
    /// Pop a boolean, push its negation.
    Not,
    /// Unconditional jump to the given instruction index.
    Branch(u16),
    /// Pop a boolean; jump when it is false.
    BranchIfFalse(u16),
    /// Pop a u64 abort code and abort execution.
    Abort,
    /// Finish execution, popping the declared return value if any.
    Ret,
    /// Pop a byte key; push the raw value (empty when absent), then push
    /// `found: bool`, reading from the module's raw storage namespace.
    StGet,
    /// Pop a byte value then a byte key; write into the module's raw
    /// storage namespace.
    StSet,
    /// Pop a byte key; delete it from the module's raw storage namespace.
    StRemove,
    /// Pop one value per field (in reverse declaration order) of the
    /// indexed struct and publish the resource under the sender.
    MoveTo(u16),
    /// Pop an address; remove the indexed resource from under it and push
    /// its field values in declaration order.
    MoveFrom(u16),
    /// Pop an address; push whether the indexed resource exists under it.
    Exists(u16),
    /// Pop a byte payload and emit it as a contract event.
    Emit,
    /// Pop an amount (u128) then a recipient address; transfer from the
    /// transaction sender via the bank capability.
    Transfer,
    /// Pop a request byte payload; push the external query response.
    Query,
}

impl Bytecode {
    /// A short mnemonic for disassembly output.
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Bytecode::PushBool(_) => "push_bool",
            Bytecode::PushU64(_) => "push_u64",
            Bytecode::PushU128(_) => "push_u128",
            Bytecode::PushAddress(_) => "push_address",
            Bytecode::PushBytes(_) => "push_bytes",
            Bytecode::CopyArg(_) => "copy_arg",
            Bytecode::Pop => "pop",
            Bytecode::Dup => "dup",
            Bytecode::Add => "add",
            Bytecode::Sub => "sub",
            Bytecode::Mul => "mul",
            Bytecode::Div => "div",
            Bytecode::Mod => "mod",
            Bytecode::Eq => "eq",
            Bytecode::Lt => "lt",
            Bytecode::Not => "not",
            Bytecode::Branch(_) => "branch",
            Bytecode::BranchIfFalse(_) => "branch_if_false",
            Bytecode::Abort => "abort",
            Bytecode::Ret => "ret",
            Bytecode::StGet => "st_get",
            Bytecode::StSet => "st_set",
            Bytecode::StRemove => "st_remove",
            Bytecode::MoveTo(_) => "move_to",
            Bytecode::MoveFrom(_) => "move_from",
            Bytecode::Exists(_) => "exists",
            Bytecode::Emit => "emit",
            Bytecode::Transfer => "transfer",
            Bytecode::Query => "query",
        }
    }
}

// =============================================================================
// FUNCTIONS AND MODULES
// =============================================================================

/// A function definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDef {
    /// Function name, unique within the module.
    pub name: Identifier,
    /// Whether the function may be called from a transaction.
    pub is_entry: bool,
    /// Parameter types. Arguments are bound by position.
    pub params: Vec<TypeTag>,
    /// Return type, if the function returns a value. At most one return
    /// value is supported.
    pub ret: Option<TypeTag>,
    /// Function body.
    pub code: Vec<Bytecode>,
}

/// A compiled module: struct layouts plus functions, published under an
/// account address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledModule {
    /// Module name, unique per publishing address.
    pub name: Identifier,
    /// Struct (resource) layouts defined by this module.
    pub structs: Vec<StructDef>,
    /// Functions defined by this module.
    pub functions: Vec<FunctionDef>,
}

impl CompiledModule {
    /// Looks up a struct definition by name.
    #[must_use]
    pub fn struct_def(&self, name: &Identifier) -> Option<&StructDef> {
        self.structs.iter().find(|s| &s.name == name)
    }

    /// Looks up a function definition by name.
    #[must_use]
    pub fn function_def(&self, name: &Identifier) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| &f.name == name)
    }
}

/// An ordered collection of modules, as loaded at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModuleBundle(pub Vec<CompiledModule>);

impl ModuleBundle {
    /// Creates a bundle from modules.
    #[must_use]
    pub fn new(modules: Vec<CompiledModule>) -> Self {
        Self(modules)
    }

    /// Iterates the contained modules.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledModule> {
        self.0.iter()
    }

    /// Number of modules in the bundle.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the bundle carries no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
