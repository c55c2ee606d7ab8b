//! # Mock Hosts
//!
//! Rust stand-ins for the Go side of the boundary: an in-memory store,
//! bank, and query router exposed through the real capability records.
//! Every shim follows the host's contract: output buffers are created
//! with `new_unmanaged_vector`-equivalent copies and ownership passes to
//! the engine through the output pointers.

use basalt_ffi::{
    api_t, db_t, querier_t, Db, DbVtable, GoApi, GoApiVtable, GoError, GoQuerier, GoQuerierVtable,
    U8SliceView, UnmanagedVector,
};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// A scripted failure for one callback.
#[derive(Clone, Debug)]
pub struct ScriptedFailure {
    /// Raw status code the callback returns.
    pub code: i32,
    /// Message written into the error buffer, if any.
    pub msg: Option<String>,
}

impl ScriptedFailure {
    /// A failure with a message.
    pub fn new(code: GoError, msg: &str) -> Self {
        Self {
            code: code as i32,
            msg: Some(msg.to_string()),
        }
    }

    /// A failure without a message, exercising the engine's defaults.
    pub fn bare(code: GoError) -> Self {
        Self {
            code: code as i32,
            msg: None,
        }
    }
}

/// The mock host process: storage, bank, and query state behind interior
/// mutability so the capability records can share it.
#[derive(Default)]
pub struct MockHost {
    /// Key-value store backing the Db capability.
    pub store: RefCell<BTreeMap<Vec<u8>, Vec<u8>>>,
    /// Transfer log: (sender, recipient, amount).
    pub transfers: RefCell<Vec<(Vec<u8>, Vec<u8>, u128)>>,
    /// Canned response for external queries.
    pub query_response: RefCell<Vec<u8>>,
    /// Forced failure for the next storage reads.
    pub read_failure: RefCell<Option<ScriptedFailure>>,
    /// Forced failure for the next storage writes.
    pub write_failure: RefCell<Option<ScriptedFailure>>,
    /// Forced failure for bank transfers.
    pub transfer_failure: RefCell<Option<ScriptedFailure>>,
    /// Number of read callbacks observed.
    pub reads_seen: Cell<u64>,
}

impl MockHost {
    /// Creates an empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the store for byte-identical comparisons.
    pub fn store_snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.store.borrow().clone()
    }

    /// Builds the storage capability over this host.
    pub fn db(&self) -> Db {
        Db {
            state: (self as *const MockHost as *mut db_t),
            vtable: DbVtable {
                read_db: mock_read_db,
                write_db: mock_write_db,
                remove_db: mock_remove_db,
            },
        }
    }

    /// Builds the bank capability over this host.
    pub fn api(&self) -> GoApi {
        GoApi {
            state: (self as *const MockHost as *const api_t),
            vtable: GoApiVtable {
                bank_transfer: mock_bank_transfer,
            },
        }
    }

    /// Builds the query capability over this host.
    pub fn querier(&self) -> GoQuerier {
        GoQuerier {
            state: (self as *const MockHost as *const querier_t),
            vtable: GoQuerierVtable {
                query_external: mock_query_external,
            },
        }
    }
}

/// Writes a scripted failure's message and returns its code.
fn fail(failure: &ScriptedFailure, errmsg: *mut UnmanagedVector) -> i32 {
    if let Some(msg) = &failure.msg {
        if !errmsg.is_null() {
            unsafe {
                *errmsg = UnmanagedVector::new(Some(msg.clone().into_bytes()));
            }
        }
    }
    failure.code
}

extern "C" fn mock_read_db(
    state: *mut db_t,
    key: U8SliceView,
    out: *mut UnmanagedVector,
    errmsg: *mut UnmanagedVector,
) -> i32 {
    let host = unsafe { &*(state as *const MockHost) };
    host.reads_seen.set(host.reads_seen.get() + 1);

    if let Some(failure) = host.read_failure.borrow().as_ref() {
        return fail(failure, errmsg);
    }

    let key = key.read().unwrap_or_default();
    let value = host.store.borrow().get(key).cloned();
    unsafe {
        // absent key -> absent result, by contract
        *out = UnmanagedVector::new(value);
    }
    GoError::None as i32
}

extern "C" fn mock_write_db(
    state: *mut db_t,
    key: U8SliceView,
    value: U8SliceView,
    errmsg: *mut UnmanagedVector,
) -> i32 {
    let host = unsafe { &*(state as *const MockHost) };

    if let Some(failure) = host.write_failure.borrow().as_ref() {
        return fail(failure, errmsg);
    }

    let key = key.read().unwrap_or_default().to_vec();
    let value = value.read().unwrap_or_default().to_vec();
    host.store.borrow_mut().insert(key, value);
    GoError::None as i32
}

extern "C" fn mock_remove_db(
    state: *mut db_t,
    key: U8SliceView,
    _errmsg: *mut UnmanagedVector,
) -> i32 {
    let host = unsafe { &*(state as *const MockHost) };
    let key = key.read().unwrap_or_default();
    host.store.borrow_mut().remove(key);
    GoError::None as i32
}

extern "C" fn mock_bank_transfer(
    state: *const api_t,
    sender: U8SliceView,
    recipient: U8SliceView,
    amount: U8SliceView,
    errmsg: *mut UnmanagedVector,
) -> i32 {
    let host = unsafe { &*(state as *const MockHost) };

    if let Some(failure) = host.transfer_failure.borrow().as_ref() {
        return fail(failure, errmsg);
    }

    let sender = sender.read().unwrap_or_default().to_vec();
    let recipient = recipient.read().unwrap_or_default().to_vec();
    let amount_bytes: [u8; 16] = match amount.read().unwrap_or_default().try_into() {
        Ok(bytes) => bytes,
        Err(_) => return GoError::BadArgument as i32,
    };
    let amount = u128::from_le_bytes(amount_bytes);

    host.transfers.borrow_mut().push((sender, recipient, amount));
    GoError::None as i32
}

extern "C" fn mock_query_external(
    state: *const querier_t,
    request: U8SliceView,
    out: *mut UnmanagedVector,
    _errmsg: *mut UnmanagedVector,
) -> i32 {
    let host = unsafe { &*(state as *const MockHost) };
    let response = host.query_response.borrow().clone();
    let response = if response.is_empty() {
        // default mock behavior: echo the request back
        request.read().unwrap_or_default().to_vec()
    } else {
        response
    };
    unsafe {
        *out = UnmanagedVector::new(Some(response));
    }
    GoError::None as i32
}
