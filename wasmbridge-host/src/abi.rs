// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The calling convention shared by the host and the generated module.
//!
//! The module exports a linear memory and three runtime functions:
//!
//! | export | signature |
//! |---|---|
//! | [`MEMORY`] | linear memory |
//! | [`MALLOC`] | `(size: i32, align: i32) -> ptr: i32` |
//! | [`FREE`] | `(ptr: i32, size: i32, align: i32)` |
//! | [`ADD_TO_STACK_POINTER`] | `(delta: i32) -> sp: i32` |
//!
//! A byte function with `n` byte-slice arguments has the shape
//! `(retptr, ptr0, len0, ..., ptrN, lenN) -> ()`. Argument buffers are
//! allocated by the host with [`MALLOC`] and owned by the callee afterwards.
//! On return the callee has written little-endian `i32` words at `retptr`:
//!
//! | returns | words | bytes |
//! |---|---|---|
//! | [`Returns::Bytes`] | `ptr, len` | [`BYTES_RETURN_AREA_SIZE`] |
//! | [`Returns::Fallible`] | `ptr, len, err, is_err` | [`FALLIBLE_RETURN_AREA_SIZE`] |
//!
//! An infallible function leaves the rest of the area untouched, so only the
//! words its shape declares are read. For a fallible function with a
//! non-zero `is_err` the output slice is a UTF-8 message; `err` is the guest's
//! own error value and is not interpreted by the host. The host copies the
//! output out and releases it with [`FREE`].
//!
//! The return area lives on the guest shadow stack: the host reserves it with
//! `ADD_TO_STACK_POINTER(-RETURN_AREA_SIZE_ALIGNED)` and gives it back with the
//! opposite delta once the call is over, whether or not the call succeeded.

use crate::function::Returns;

/// Linear memory export
pub const MEMORY: &str = "memory";
/// Guest allocator
pub const MALLOC: &str = "__wbindgen_malloc";
/// Guest deallocator
pub const FREE: &str = "__wbindgen_free";
/// Shadow stack adjustment
pub const ADD_TO_STACK_POINTER: &str = "__wbindgen_add_to_stack_pointer";
/// Post-instantiation routine run once after binding
pub const DEFAULT_START_SYMBOL: &str = "__wbindgen_start";
/// Host import the guest calls to raise an error with a message
pub const THROW_IMPORT: &str = "__wbindgen_throw";

/// Bytes written at `retptr` by an infallible byte function
pub const BYTES_RETURN_AREA_SIZE: usize = 8;
/// Bytes written at `retptr` by a fallible byte function
pub const FALLIBLE_RETURN_AREA_SIZE: usize = 16;
/// Stack space reserved for the return area, large enough for either shape
pub const RETURN_AREA_SIZE_ALIGNED: i32 = 16;
/// Alignment requested for argument buffers
pub const BYTE_ALIGN: i32 = 1;

/// Decoded return area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReturnArea {
    /// Guest pointer to the output bytes
    pub ptr:    u32,
    /// Output length in bytes
    pub len:    u32,
    /// Guest error value, always zero for [`Returns::Bytes`]
    pub err:    u32,
    /// The output is an error message
    pub is_err: bool,
}

impl ReturnArea {
    /// Decodes the words a function of shape `returns` wrote. Bytes past
    /// [`Returns::return_area_size`] are ignored.
    #[must_use]
    pub fn decode(returns: Returns, raw: &[u8; FALLIBLE_RETURN_AREA_SIZE]) -> Self {
        let word = |i: usize| u32::from_le_bytes([raw[i], raw[i + 1], raw[i + 2], raw[i + 3]]);
        match returns {
            Returns::Bytes => Self {
                ptr:    word(0),
                len:    word(4),
                err:    0,
                is_err: false,
            },
            Returns::Fallible => Self {
                ptr:    word(0),
                len:    word(4),
                err:    word(8),
                is_err: word(12) != 0,
            },
        }
    }
}

/// Number of `i32` parameters of a byte function taking `arity` slices.
#[must_use]
pub const fn param_count(arity: usize) -> usize {
    1 + 2 * arity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_return_area() {
        let mut raw = [0u8; FALLIBLE_RETURN_AREA_SIZE];
        raw[0..4].copy_from_slice(&0x0001_0010_u32.to_le_bytes());
        raw[4..8].copy_from_slice(&32_u32.to_le_bytes());
        let area = ReturnArea::decode(Returns::Bytes, &raw);
        assert_eq!(area.ptr, 0x0001_0010);
        assert_eq!(area.len, 32);
        assert!(!area.is_err);

        raw[12] = 1;
        assert!(ReturnArea::decode(Returns::Fallible, &raw).is_err);
    }

    #[test]
    fn test_infallible_shape_ignores_trailing_words() {
        let mut raw = [0xffu8; FALLIBLE_RETURN_AREA_SIZE];
        raw[0..8].fill(0);
        let area = ReturnArea::decode(Returns::Bytes, &raw);
        assert!(!area.is_err);
        assert_eq!(area.err, 0);
    }

    #[test]
    fn test_error_slot_is_not_the_flag() {
        let mut raw = [0u8; FALLIBLE_RETURN_AREA_SIZE];
        raw[8..12].copy_from_slice(&7_u32.to_le_bytes());
        let area = ReturnArea::decode(Returns::Fallible, &raw);
        assert_eq!(area.err, 7);
        assert!(!area.is_err);
    }

    #[test]
    fn test_param_count() {
        assert_eq!(param_count(0), 1);
        assert_eq!(param_count(1), 3);
        assert_eq!(param_count(2), 5);
    }
}
