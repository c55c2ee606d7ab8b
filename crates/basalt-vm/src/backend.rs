//! # Backend Capabilities
//!
//! The traits the host implements to give the engine access to its state.
//! One implementation of each is provided per call by the boundary layer;
//! the engine borrows them for the duration of that call and never retains
//! them. All operations are synchronous: the boundary has no suspension
//! points.

use crate::errors::BackendResult;
use basalt_types::AccountAddress;

/// Access to the engine's backing storage, i.e. the chain state.
pub trait Storage {
    /// Reads the value stored at `key`.
    ///
    /// Returns `Ok(None)` when the key does not exist: a missing key is
    /// not an error. Returns `Ok(Some(..))` when it does.
    fn get(&self, key: &[u8]) -> BackendResult<Option<Vec<u8>>>;

    /// Writes `value` at `key`, overwriting any existing entry.
    fn set(&mut self, key: &[u8], value: &[u8]) -> BackendResult<()>;

    /// Removes the entry at `key`.
    ///
    /// The interface cannot distinguish removing an existing key from
    /// removing an absent one; both succeed.
    fn remove(&mut self, key: &[u8]) -> BackendResult<()>;
}

/// Access to the host's account/bank layer.
pub trait BankApi {
    /// Moves `amount` base units from `sender` to `recipient`.
    ///
    /// A semantic failure (insufficient funds, frozen account) comes back
    /// as a user-level backend error.
    fn transfer(
        &self,
        sender: AccountAddress,
        recipient: AccountAddress,
        amount: u128,
    ) -> BackendResult<()>;
}

/// Access to the host's external query router.
pub trait Querier {
    /// Sends an opaque request to the host and returns its response
    /// bytes. The request and response formats are host-defined.
    fn query(&self, request: &[u8]) -> BackendResult<Vec<u8>>;
}
