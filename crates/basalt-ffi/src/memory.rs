//! # Boundary Buffers
//!
//! The two byte-buffer shapes that cross the boundary, and the exported
//! lifecycle operations for the owned one.
//!
//! ## Ownership model
//!
//! The host and the engine run different memory managers; neither may
//! free the other's allocations. Every buffer crossing the boundary is
//! therefore one of:
//!
//! - [`ByteSliceView`] / [`U8SliceView`]: non-owning views. The producer
//!   guarantees the referenced memory outlives the call; the consumer
//!   must not retain the pointer past it.
//! - [`UnmanagedVector`]: an owned buffer. Ownership is the right and
//!   the obligation to destroy it exactly once, and it always travels
//!   with the value: whoever ends up holding an `UnmanagedVector` must
//!   either [`consume`](UnmanagedVector::consume) it into its own
//!   memory or hand it to [`destroy_unmanaged_vector`].
//!
//! An `UnmanagedVector` is never copied to duplicate ownership, and it is
//! immutable while crossing: transformations happen after consuming.
//!
//! The host creates owned buffers only through [`new_unmanaged_vector`],
//! which copies host bytes into engine-managed memory; it then passes
//! ownership back to the engine by writing the value through a callback's
//! output pointer. The engine creates owned buffers with
//! [`UnmanagedVector::new`] and relinquishes them by returning them from
//! an entry point; the host copies the contents out and calls
//! [`destroy_unmanaged_vector`].

use std::mem;
use std::slice;

// =============================================================================
// OWNED BUFFER
// =============================================================================

/// An optional, owned byte buffer with engine-managed memory.
///
/// `is_none` distinguishes the absent buffer from a present-but-empty
/// one; when it is set, the remaining fields carry no meaning. A present
/// empty buffer is stored without an allocation (`cap == 0`), so
/// create/destroy cycles on empty payloads never touch the allocator.
#[repr(C)]
#[derive(Debug)]
pub struct UnmanagedVector {
    /// True when no buffer is present. The other fields must then be
    /// ignored.
    is_none: bool,
    ptr: *mut u8,
    len: usize,
    cap: usize,
}

impl UnmanagedVector {
    /// Takes ownership of `source`'s allocation, or builds the absent
    /// value from `None`.
    ///
    /// The allocation is deliberately leaked out of Rust's drop
    /// discipline here; it is recovered byte-for-byte in
    /// [`consume`](UnmanagedVector::consume).
    #[must_use]
    pub fn new(source: Option<Vec<u8>>) -> Self {
        match source {
            Some(data) => {
                let (ptr, len, cap) = if data.capacity() == 0 {
                    // no allocation to steal
                    (std::ptr::null_mut(), 0, 0)
                } else {
                    let mut data = mem::ManuallyDrop::new(data);
                    (data.as_mut_ptr(), data.len(), data.capacity())
                };
                Self {
                    is_none: false,
                    ptr,
                    len,
                    cap,
                }
            }
            None => Self {
                is_none: true,
                ptr: std::ptr::null_mut(),
                len: 0,
                cap: 0,
            },
        }
    }

    /// True when a buffer is present (possibly empty).
    #[must_use]
    pub fn is_some(&self) -> bool {
        !self.is_none
    }

    /// True when no buffer is present.
    #[must_use]
    pub fn is_none(&self) -> bool {
        self.is_none
    }

    /// Transfers the bytes into a caller-owned `Vec`, discharging this
    /// value's ownership obligation in the same step. This is the only
    /// sanctioned read path.
    #[must_use]
    pub fn consume(self) -> Option<Vec<u8>> {
        if self.is_none {
            None
        } else if self.cap == 0 {
            // present but empty; no allocation was made
            Some(Vec::new())
        } else {
            Some(unsafe { Vec::from_raw_parts(self.ptr, self.len, self.cap) })
        }
    }
}

impl Default for UnmanagedVector {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Copies host bytes into a newly allocated engine-managed buffer and
/// returns ownership to the caller.
///
/// A `nil` input produces the absent buffer; a null or empty input
/// produces a present empty one. Allocation exhaustion aborts the
/// process: there is no recovery path once the allocator fails.
#[no_mangle]
pub extern "C" fn new_unmanaged_vector(
    nil: bool,
    ptr: *const u8,
    length: usize,
) -> UnmanagedVector {
    if nil {
        UnmanagedVector::new(None)
    } else if ptr.is_null() || length == 0 {
        UnmanagedVector::new(Some(Vec::new()))
    } else {
        let external = unsafe { slice::from_raw_parts(ptr, length) };
        UnmanagedVector::new(Some(external.to_vec()))
    }
}

/// Releases an owned buffer received from the engine.
///
/// Must be called exactly once per owned buffer. Calling it twice on the
/// same value is a caller contract violation with undefined behavior, not
/// a recoverable error.
#[no_mangle]
pub extern "C" fn destroy_unmanaged_vector(v: UnmanagedVector) {
    let _ = v.consume();
}

// =============================================================================
// BORROWED VIEWS
// =============================================================================

/// A non-owning view into a host-owned byte slice, passed into entry
/// points.
///
/// Valid only for the duration of the call that received it: the host
/// guarantees the memory outlives the call, and the engine never stores
/// the pointer. A view cannot be duplicated for later use; callers
/// needing a persisted copy go through
/// [`to_owned`](ByteSliceView::to_owned).
///
/// The host's nil slice is fully representable, distinct from a present
/// empty slice.
#[repr(C)]
#[derive(Debug)]
pub struct ByteSliceView {
    /// True when the host passed nil. The other fields must then be
    /// ignored.
    is_nil: bool,
    ptr: *const u8,
    len: usize,
}

impl ByteSliceView {
    /// Creates a view over `source`. The caller keeps ownership and must
    /// keep the slice alive for the duration of the call the view is
    /// passed into.
    #[must_use]
    pub fn new(source: &[u8]) -> Self {
        Self {
            is_nil: false,
            ptr: source.as_ptr(),
            len: source.len(),
        }
    }

    /// Creates the nil view.
    #[must_use]
    pub fn nil() -> Self {
        Self {
            is_nil: true,
            ptr: std::ptr::null(),
            len: 0,
        }
    }

    /// Borrows the viewed bytes, or `None` for the nil view.
    #[must_use]
    pub fn read(&self) -> Option<&[u8]> {
        if self.is_nil {
            None
        } else if self.ptr.is_null() || self.len == 0 {
            Some(&[])
        } else {
            Some(unsafe { slice::from_raw_parts(self.ptr, self.len) })
        }
    }

    /// Copies the viewed bytes into an owned buffer, for the rare caller
    /// that must persist past the call.
    #[must_use]
    pub fn to_owned(&self) -> Option<Vec<u8>> {
        self.read().map(<[u8]>::to_vec)
    }
}

/// A non-owning view into an engine-owned `Option<&[u8]>`, passed into
/// host callbacks.
///
/// The mirror image of [`ByteSliceView`]: the engine produces it, the
/// host copies out of it before the callback returns.
#[repr(C)]
#[derive(Debug)]
pub struct U8SliceView {
    /// True when this represents `None`. The other fields must then be
    /// ignored.
    is_none: bool,
    ptr: *const u8,
    len: usize,
}

impl U8SliceView {
    /// Creates a view over an optional slice.
    #[must_use]
    pub fn new(source: Option<&[u8]>) -> Self {
        match source {
            Some(data) => Self {
                is_none: false,
                ptr: data.as_ptr(),
                len: data.len(),
            },
            None => Self {
                is_none: true,
                ptr: std::ptr::null(),
                len: 0,
            },
        }
    }

    /// Borrows the viewed bytes, or `None` for the absent view. Used by
    /// the Rust-side mock hosts in the test suite; the real consumer is
    /// the host process.
    #[must_use]
    pub fn read(&self) -> Option<&[u8]> {
        if self.is_none {
            None
        } else if self.ptr.is_null() || self.len == 0 {
            Some(&[])
        } else {
            Some(unsafe { slice::from_raw_parts(self.ptr, self.len) })
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
