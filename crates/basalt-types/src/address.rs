//! # Account Addresses
//!
//! 32-byte account addresses. Genesis modules live under the reserved
//! framework address `0x1`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of an account address in bytes.
pub const ADDRESS_LENGTH: usize = 32;

/// A 32-byte account address.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct AccountAddress(pub [u8; ADDRESS_LENGTH]);

impl AccountAddress {
    /// The zero address.
    pub const ZERO: Self = Self([0u8; ADDRESS_LENGTH]);

    /// The reserved framework address (`0x1`) that genesis modules are
    /// published under.
    pub const FRAMEWORK: Self = {
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes[ADDRESS_LENGTH - 1] = 1;
        Self(bytes)
    };

    /// Creates an address from a 32-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice.
    ///
    /// # Errors
    ///
    /// Returns [`AddressParseError::WrongLength`] if the slice is not
    /// exactly 32 bytes.
    pub fn from_bytes(slice: &[u8]) -> Result<Self, AddressParseError> {
        if slice.len() != ADDRESS_LENGTH {
            return Err(AddressParseError::WrongLength(slice.len()));
        }
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// Renders the address as `0x`-prefixed lowercase hex with leading
    /// zeros trimmed (`0x1` for the framework address).
    #[must_use]
    pub fn to_short_hex(&self) -> String {
        let trimmed: Vec<u8> = self.0.iter().skip_while(|b| **b == 0).copied().collect();
        if trimmed.is_empty() {
            "0x0".to_string()
        } else {
            let encoded = hex::encode(trimmed);
            format!("0x{}", encoded.trim_start_matches('0'))
        }
    }
}

impl fmt::Debug for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for AccountAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; ADDRESS_LENGTH]> for AccountAddress {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl FromStr for AccountAddress {
    type Err = AddressParseError;

    /// Parses a `0x`-prefixed hex address. Short forms are zero-extended
    /// on the left, so `0x1` parses to the framework address.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("0x").unwrap_or(s);
        if raw.is_empty() || raw.len() > ADDRESS_LENGTH * 2 {
            return Err(AddressParseError::InvalidHex(s.to_string()));
        }
        // zero-pad to an even, full-width hex string
        let padded = format!("{raw:0>64}");
        let decoded =
            hex::decode(&padded).map_err(|_| AddressParseError::InvalidHex(s.to_string()))?;
        Self::from_bytes(&decoded)
    }
}

/// Errors from parsing an account address.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    /// Input was not 32 bytes.
    #[error("invalid address length: expected {ADDRESS_LENGTH} bytes, got {0}")]
    WrongLength(usize),

    /// Input was not valid hex.
    #[error("invalid address hex: {0}")]
    InvalidHex(String),
}

// =============================================================================
// TESTS
// =============================================================================
