//! C entry points (requires `ffi` feature).
//!
//! Three functions with C linkage over the RaptorQ engine and the plain wire
//! format. Every failure collapses to `false`; the reason is logged at
//! `debug` level through `tracing`. Panics never cross the boundary.
//!
//! ```c
//! uint32_t fecframe_list_block_sizes(uint16_t *sizes, uint32_t capacity);
//! bool fecframe_encode(int64_t symbol_size, uint16_t symbols, uint32_t repair,
//!                      const uint8_t *input, size_t input_len,
//!                      uint8_t *output, size_t output_cap, size_t *actual_len);
//! bool fecframe_decode(size_t bytes, uint16_t symbols, int64_t symbol_size,
//!                      const uint8_t *input, size_t input_len,
//!                      uint8_t *output, size_t output_cap, size_t *actual_len);
//! ```

#![allow(unsafe_code)]

use std::panic::{self, AssertUnwindSafe};
use std::slice;

use tracing::debug;

use crate::codec::list_block_sizes;
use crate::config::FecConfig;
use crate::decoder::decode;
use crate::encoder::encode;
use crate::error::FecError;

/// Converts a C symbol size, rejecting non-positive and over-wide values.
fn symbol_size_from_c(symbol_size: i64) -> Option<usize> {
    if symbol_size <= 0 || symbol_size > i64::from(u16::MAX) {
        return None;
    }
    usize::try_from(symbol_size).ok()
}

/// Runs `op`, logging and swallowing errors and panics.
fn run_guarded<F>(name: &'static str, op: F) -> Option<usize>
where
    F: FnOnce() -> Result<usize, FecError>,
{
    match panic::catch_unwind(AssertUnwindSafe(op)) {
        Ok(Ok(len)) => Some(len),
        Ok(Err(e)) => {
            debug!(call = name, error = %e, "ffi call failed");
            None
        }
        Err(_) => {
            debug!(call = name, "ffi call panicked");
            None
        }
    }
}

/// Lists the supported block sizes (K values).
///
/// With a null `sizes`, returns the number of supported sizes. Otherwise
/// copies at most `capacity` sizes and returns how many were copied.
///
/// # Safety
///
/// `sizes` must be null or valid for writes of `capacity` `u16` values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn fecframe_list_block_sizes(sizes: *mut u16, capacity: u32) -> u32 {
    if sizes.is_null() {
        return list_block_sizes(None, 0);
    }

    // SAFETY: non-null, and the caller guarantees `capacity` writable slots.
    let buf = unsafe { slice::from_raw_parts_mut(sizes, capacity as usize) };
    panic::catch_unwind(AssertUnwindSafe(|| list_block_sizes(Some(buf), capacity))).unwrap_or(0)
}

/// Encodes `input` into `output`.
///
/// On success writes the number of bytes produced to `actual_len` and
/// returns `true`. On failure returns `false`; `output` may have been
/// partially written and `actual_len` is left untouched.
///
/// # Safety
///
/// - `input` must be valid for reads of `input_len` bytes.
/// - `output` must be valid for writes of `output_cap` bytes.
/// - `actual_len` must be valid for a write of one `usize`.
/// - `input` and `output` must not overlap.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn fecframe_encode(
    symbol_size: i64,
    symbols: u16,
    repair: u32,
    input: *const u8,
    input_len: usize,
    output: *mut u8,
    output_cap: usize,
    actual_len: *mut usize,
) -> bool {
    if input.is_null() || output.is_null() || actual_len.is_null() {
        return false;
    }
    let Some(symbol_size) = symbol_size_from_c(symbol_size) else {
        return false;
    };

    // SAFETY: non-null, sizes and aliasing guaranteed by the caller.
    let (input, output) = unsafe {
        (
            slice::from_raw_parts(input, input_len),
            slice::from_raw_parts_mut(output, output_cap),
        )
    };

    let Some(len) = run_guarded("fecframe_encode", || {
        let config = FecConfig::new(symbol_size, symbols, repair)?;
        encode(config, input, output)
    }) else {
        return false;
    };

    // SAFETY: checked for null above, validity guaranteed by the caller.
    unsafe { actual_len.write(len) };
    true
}

/// Decodes `bytes` original bytes from the frames in `input` into `output`.
///
/// On success writes `bytes` to `actual_len` and returns `true`. On failure
/// returns `false`; `actual_len` is left untouched.
///
/// # Safety
///
/// - `input` must be valid for reads of `input_len` bytes.
/// - `output` must be valid for writes of `output_cap` bytes.
/// - `actual_len` must be valid for a write of one `usize`.
/// - `input` and `output` must not overlap.
#[unsafe(no_mangle)]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn fecframe_decode(
    bytes: usize,
    symbols: u16,
    symbol_size: i64,
    input: *const u8,
    input_len: usize,
    output: *mut u8,
    output_cap: usize,
    actual_len: *mut usize,
) -> bool {
    if input.is_null() || output.is_null() || actual_len.is_null() {
        return false;
    }
    let Some(symbol_size) = symbol_size_from_c(symbol_size) else {
        return false;
    };

    // SAFETY: non-null, sizes and aliasing guaranteed by the caller.
    let (input, output) = unsafe {
        (
            slice::from_raw_parts(input, input_len),
            slice::from_raw_parts_mut(output, output_cap),
        )
    };

    let Some(len) = run_guarded("fecframe_decode", || {
        let config = FecConfig::new(symbol_size, symbols, 0)?;
        decode(config, bytes, input, output)
    }) else {
        return false;
    };

    // SAFETY: checked for null above, validity guaranteed by the caller.
    unsafe { actual_len.write(len) };
    true
}
