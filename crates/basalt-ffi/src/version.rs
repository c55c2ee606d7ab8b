//! # Version Export

use std::os::raw::c_char;

static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0"); // trailing NUL for C

/// Returns the version of this library as a C string.
///
/// The string is statically owned by the library and must not be mutated
/// or freed by the caller.
#[no_mangle]
pub extern "C" fn version_str() -> *const c_char {
    VERSION.as_ptr() as *const _
}
