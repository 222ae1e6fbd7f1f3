use std::ptr;
use std::slice;

use libc::{c_char, c_void};
use log::{debug, warn};
use slua_compiler::CompileOptions;

use crate::buffer::{Allocator, CompiledBuffer};
use crate::outcome::Outcome;

/// Compiles `size` bytes at `source` with the default options.
///
/// Returns a `malloc`-owned buffer of exactly `*outsize` bytes holding
/// either bytecode or, when `*is_error` is set, a diagnostic. Returns null
/// with `*outsize == 0` when the buffer cannot be allocated.
///
/// # Safety
/// `source` must point to `size` readable bytes (or be null with `size`
/// 0). `outsize` and `is_error` must be valid for writes.
#[no_mangle]
pub unsafe extern "C" fn slua_compile(
    source: *const c_char,
    size: usize,
    outsize: *mut usize,
    is_error: *mut bool,
) -> *mut c_char {
    let options = CompileOptions::default();
    slua_compile_with_options(source, size, options.optimization_level, options.debug_level, outsize, is_error)
}

/// Like `slua_compile`, with explicit optimization and debug levels.
///
/// # Safety
/// Same as `slua_compile`.
#[no_mangle]
pub unsafe extern "C" fn slua_compile_with_options(
    source: *const c_char,
    size: usize,
    optimization_level: u8,
    debug_level: u8,
    outsize: *mut usize,
    is_error: *mut bool,
) -> *mut c_char {
    let options = CompileOptions::new(optimization_level, debug_level);
    compile_with_allocator(source, size, options, outsize, is_error, libc::malloc)
}

/// Releases a buffer returned by `slua_compile`. Null is ignored.
///
/// # Safety
/// `buffer` must be null or a pointer returned by this library that has
/// not been freed yet.
#[no_mangle]
pub unsafe extern "C" fn slua_free(buffer: *mut c_char) {
    if !buffer.is_null() {
        libc::free(buffer as *mut c_void);
    }
}

pub(crate) unsafe fn compile_with_allocator(
    source: *const c_char,
    size: usize,
    options: CompileOptions,
    outsize: *mut usize,
    is_error: *mut bool,
    allocate: Allocator,
) -> *mut c_char {
    if outsize.is_null() || is_error.is_null() {
        warn!("slua_compile called without output parameters");
        return ptr::null_mut();
    }
    *outsize = 0;

    let outcome = if source.is_null() {
        if size == 0 {
            crate::compile(&[], &options)
        } else {
            warn!("slua_compile called with a null source of {} bytes", size);
            Outcome::InternalFailure
        }
    } else {
        crate::compile(slice::from_raw_parts(source as *const u8, size), &options)
    };

    *is_error = outcome.is_error();
    let payload = outcome.into_payload();
    match CompiledBuffer::copy_with(&payload, allocate) {
        Some(buffer) => {
            let (raw, len) = buffer.into_raw();
            *outsize = len;
            debug!("returning a {} byte payload", len);
            raw
        }
        None => {
            warn!("could not allocate a {} byte payload", payload.len());
            ptr::null_mut()
        }
    }
}
