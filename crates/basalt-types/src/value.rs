//! # Runtime Values
//!
//! The values the interpreter pushes and pops, the arguments callers pass
//! in messages, and the field values stored inside resources.

use crate::address::AccountAddress;
use crate::module::TypeTag;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A runtime value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    /// Boolean.
    Bool(bool),
    /// 64-bit unsigned integer.
    U64(u64),
    /// 128-bit unsigned integer.
    U128(u128),
    /// Account address.
    Address(AccountAddress),
    /// Raw byte vector.
    Bytes(Vec<u8>),
}

impl Value {
    /// Returns the type tag of this value.
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Value::Bool(_) => TypeTag::Bool,
            Value::U64(_) => TypeTag::U64,
            Value::U128(_) => TypeTag::U128,
            Value::Address(_) => TypeTag::Address,
            Value::Bytes(_) => TypeTag::Bytes,
        }
    }

    /// True when the value matches the given type tag.
    #[must_use]
    pub fn matches(&self, tag: TypeTag) -> bool {
        self.type_tag() == tag
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U64(v) => write!(f, "{v}u64"),
            Value::U128(v) => write!(f, "{v}u128"),
            Value::Address(v) => write!(f, "{}", v.to_short_hex()),
            Value::Bytes(v) => write!(f, "0x{}", hex::encode(v)),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::U64(v)
    }
}

impl From<u128> for Value {
    fn from(v: u128) -> Self {
        Value::U128(v)
    }
}

impl From<AccountAddress> for Value {
    fn from(v: AccountAddress) -> Self {
        Value::Address(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

// =============================================================================
// TESTS
// =============================================================================
