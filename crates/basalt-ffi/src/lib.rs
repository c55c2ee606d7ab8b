//! # Basalt FFI
//!
//! The C boundary of the Basalt VM, loaded by the host process (a Go
//! chain node) as a shared library.
//!
//! The host and the engine are independently memory-managed runtimes;
//! this crate is the only place where their data meets. It defines:
//!
//! - the buffer ownership protocol ([`UnmanagedVector`],
//!   [`ByteSliceView`], [`U8SliceView`]; see [`memory`]);
//! - the capability records the host passes in ([`Db`], [`GoApi`],
//!   [`GoQuerier`]) and their engine-facing wrappers;
//! - the dual error taxonomies ([`GoError`] for callbacks,
//!   [`RustError`] plus errno for entry points);
//! - the exported entry points themselves (see [`interface`]).
//!
//! Everything here is synchronous and per-call: capability objects and
//! views are borrowed for exactly one entry-point invocation, and every
//! owned buffer crossing the boundary has exactly one destroy.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::not_unsafe_ptr_arg_deref)]

pub mod api;
pub mod db;
pub mod error;
pub mod interface;
pub mod memory;
pub mod querier;
pub mod result;
pub mod storage;
pub mod version;
mod vm;

pub use api::{api_t, GoApi, GoApiVtable};
pub use db::{db_t, Db, DbVtable};
pub use error::{ErrnoValue, GoError, RustError};
pub use interface::{
    decode_module_bytes, decode_move_resource, decode_script_bytes, execute_contract,
    execute_script, initialize, publish_module, query_contract,
};
pub use memory::{
    destroy_unmanaged_vector, new_unmanaged_vector, ByteSliceView, U8SliceView, UnmanagedVector,
};
pub use querier::{querier_t, GoQuerier, GoQuerierVtable};
pub use storage::GoStorage;
pub use version::version_str;
