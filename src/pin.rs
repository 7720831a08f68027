//! Pinned-buffer bridge.
//!
//! Lends a caller-owned byte buffer to exactly one synchronous creation call.
//! The engine reads (or copies) the memory before that call returns, so the
//! borrow only has to outlive the closure. A drop guard marks the release so
//! it happens exactly once on every exit path, unwinding included.

use std::cell::Cell;
use std::ffi::c_void;
use std::marker::PhantomData;
use std::ptr;

use log::trace;

use crate::error::{BassError, Result};
use crate::ffi::QWORD;

thread_local! {
    static ACTIVE_PINS: Cell<usize> = const { Cell::new(0) };
    static RELEASED_PINS: Cell<u64> = const { Cell::new(0) };
}

/// Pins currently held on this thread.
pub fn active_pins() -> usize {
    ACTIVE_PINS.with(|c| c.get())
}

/// Pins released on this thread since it started.
pub fn released_pins() -> u64 {
    RELEASED_PINS.with(|c| c.get())
}

/// Stable view of a buffer for the length of one native call.
///
/// The address must not be kept past the closure passed to
/// [`with_pinned_buffer`].
pub struct PinnedBuffer<'a> {
    ptr: *const c_void,
    len: usize,
    _buffer: PhantomData<&'a [u8]>,
}

impl<'a> PinnedBuffer<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        // Empty buffer -> null, the engine treats that as "no memory source"
        let ptr = if buffer.is_empty() {
            ptr::null()
        } else {
            buffer.as_ptr() as *const c_void
        };
        Self {
            ptr,
            len: buffer.len(),
            _buffer: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *const c_void {
        self.ptr
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address and length of `length` bytes starting at `offset`.
    ///
    /// `length == 0` means "to the end of the buffer". An empty buffer always
    /// gives `(null, 0)`.
    pub fn region(&self, offset: QWORD, length: QWORD) -> Result<(*const c_void, QWORD)> {
        if self.is_empty() {
            return Ok((ptr::null(), 0));
        }

        let total = self.len as QWORD;
        if offset > total {
            return Err(BassError::InvalidArgument(format!(
                "offset {} beyond buffer of {} bytes",
                offset, total
            )));
        }
        let available = total - offset;
        let length = if length == 0 { available } else { length };
        if length > available {
            return Err(BassError::InvalidArgument(format!(
                "{} bytes at offset {} exceed buffer of {} bytes",
                length, offset, total
            )));
        }

        // offset <= len, so this stays inside (or one past) the allocation
        let start = unsafe { (self.ptr as *const u8).add(offset as usize) };
        Ok((start as *const c_void, length))
    }
}

/// Marks the pin released when dropped.
struct PinGuard {
    len: usize,
}

impl PinGuard {
    fn acquire(len: usize) -> Self {
        ACTIVE_PINS.with(|c| c.set(c.get() + 1));
        trace!("Pinned {} byte buffer", len);
        Self { len }
    }
}

impl Drop for PinGuard {
    fn drop(&mut self) {
        ACTIVE_PINS.with(|c| c.set(c.get().saturating_sub(1)));
        RELEASED_PINS.with(|c| c.set(c.get() + 1));
        trace!("Released pin on {} byte buffer", self.len);
    }
}

/// Run `f` with a stable address for `buffer` and return its result.
///
/// `f` should make exactly one synchronous engine call that consumes the
/// bytes before returning.
pub fn with_pinned_buffer<R>(buffer: &[u8], f: impl FnOnce(&PinnedBuffer<'_>) -> R) -> R {
    let _guard = PinGuard::acquire(buffer.len());
    let pinned = PinnedBuffer::new(buffer);
    f(&pinned)
}
