//! # Access Paths
//!
//! Stable, human-readable keys for the host's key-value storage. Every
//! piece of engine state (module code, published resources, raw module
//! state) lives under one access path, rendered as an ASCII string so the
//! host can key, inspect, and prefix-scan its own store.

use crate::address::AccountAddress;
use crate::module::{Identifier, ModuleId, StructTag};
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an access path points at.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathQualifier {
    /// Module code, keyed by module name.
    Code {
        /// Module name.
        module: Identifier,
    },
    /// A published resource, keyed by the defining struct tag's module and
    /// struct names.
    Resource {
        /// Defining module name.
        module: Identifier,
        /// Struct name.
        name: Identifier,
    },
    /// Raw module state, keyed by module name and arbitrary bytes.
    Raw {
        /// Owning module name.
        module: Identifier,
        /// Application key bytes.
        key: Vec<u8>,
    },
}

/// A fully qualified storage location: account address plus qualifier.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccessPath {
    /// The account the state belongs to.
    pub address: AccountAddress,
    /// What is stored there.
    pub qualifier: PathQualifier,
}

impl AccessPath {
    /// Path of a module's code under its publishing address.
    #[must_use]
    pub fn code(address: AccountAddress, module: Identifier) -> Self {
        Self {
            address,
            qualifier: PathQualifier::Code { module },
        }
    }

    /// Path of a resource published under `holder`.
    #[must_use]
    pub fn resource(holder: AccountAddress, tag: &StructTag) -> Self {
        Self {
            address: holder,
            qualifier: PathQualifier::Resource {
                module: tag.module.clone(),
                name: tag.name.clone(),
            },
        }
    }

    /// Path of a raw state entry in a module's namespace.
    #[must_use]
    pub fn raw(module: &ModuleId, key: Vec<u8>) -> Self {
        Self {
            address: module.address,
            qualifier: PathQualifier::Raw {
                module: module.name.clone(),
                key,
            },
        }
    }

    /// Renders the path to the byte key handed to the host's storage.
    ///
    /// The encoding is the ASCII [`fmt::Display`] form; raw application
    /// keys are hex-encoded so the rendered key never contains separators
    /// from the key bytes themselves.
    #[must_use]
    pub fn to_key(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            PathQualifier::Code { module } => {
                write!(f, "{}/code/{}", self.address.to_short_hex(), module)
            }
            PathQualifier::Resource { module, name } => {
                write!(
                    f,
                    "{}/resource/{}::{}",
                    self.address.to_short_hex(),
                    module,
                    name
                )
            }
            PathQualifier::Raw { module, key } => {
                write!(
                    f,
                    "{}/raw/{}/{}",
                    self.address.to_short_hex(),
                    module,
                    hex::encode(key)
                )
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
