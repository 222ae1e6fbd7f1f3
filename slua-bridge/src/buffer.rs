use std::mem::ManuallyDrop;
use std::ptr::{self, NonNull};
use std::slice;

use libc::{c_char, c_void};

/// Signature of `malloc`, so tests can substitute a failing allocator.
pub type Allocator = unsafe extern "C" fn(usize) -> *mut c_void;

/// A `malloc`-owned copy of a payload. The caller of the C entry points
/// releases it with `free`.
#[derive(Debug)]
pub struct CompiledBuffer {
    ptr: NonNull<u8>,
    len: usize,
}

// The buffer is uniquely owned.
unsafe impl Send for CompiledBuffer {}

impl CompiledBuffer {
    /// Returns `None` when the allocation fails.
    pub fn copy_from(bytes: &[u8]) -> Option<CompiledBuffer> {
        CompiledBuffer::copy_with(bytes, libc::malloc)
    }

    pub fn copy_with(bytes: &[u8], allocate: Allocator) -> Option<CompiledBuffer> {
        // malloc(0) may legally return null.
        let raw = unsafe { allocate(bytes.len().max(1)) };
        let ptr = NonNull::new(raw as *mut u8)?;
        unsafe { ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), bytes.len()) };
        Some(CompiledBuffer { ptr, len: bytes.len() })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    /// Gives up ownership. The pointer must be released with `free`, or
    /// turned back into a buffer with `from_raw`.
    pub fn into_raw(self) -> (*mut c_char, usize) {
        let this = ManuallyDrop::new(self);
        (this.ptr.as_ptr() as *mut c_char, this.len)
    }

    /// # Safety
    /// `ptr` must come from `into_raw` with the same `len`, and must not be
    /// used or freed elsewhere afterwards.
    pub unsafe fn from_raw(ptr: *mut c_char, len: usize) -> Option<CompiledBuffer> {
        NonNull::new(ptr as *mut u8).map(|ptr| CompiledBuffer { ptr, len })
    }
}

impl Drop for CompiledBuffer {
    fn drop(&mut self) {
        unsafe { libc::free(self.ptr.as_ptr() as *mut c_void) }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) unsafe extern "C" fn failing_allocator(_size: usize) -> *mut c_void {
        ptr::null_mut()
    }

    #[test]
    fn copies_exactly() {
        let buffer = CompiledBuffer::copy_from(b"bytecode").unwrap();
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.as_slice(), b"bytecode");

        let empty = CompiledBuffer::copy_from(&[]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.as_slice(), &[] as &[u8]);
    }

    #[test]
    fn allocation_failure() {
        assert!(CompiledBuffer::copy_with(b"bytecode", failing_allocator).is_none());
    }

    #[test]
    fn raw_roundtrip() {
        let (ptr, len) = CompiledBuffer::copy_from(b":1: oops").unwrap().into_raw();
        assert!(!ptr.is_null());
        assert_eq!(len, 8);
        let buffer = unsafe { CompiledBuffer::from_raw(ptr, len) }.unwrap();
        assert_eq!(buffer.as_slice(), b":1: oops");
        assert!(unsafe { CompiledBuffer::from_raw(ptr::null_mut(), 0) }.is_none());
    }
}
