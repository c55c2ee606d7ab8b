//! # Boundary Errors
//!
//! Two independent taxonomies, kept separate on purpose:
//!
//! - [`GoError`]: the status a host callback returns synchronously.
//! - [`RustError`]: what an entry point reports back to the host,
//!   rendered into the error-message buffer and an errno value.
//!
//! Collapsing them would make a failing host callback indistinguishable
//! from a failing decode or execution, which the host's billing logic
//! needs to tell apart.

mod go;
mod rust;

pub use go::GoError;
pub use rust::{
    clear_error, handle_c_error_binary, handle_c_error_default, set_error, ErrnoValue, RustError,
};
