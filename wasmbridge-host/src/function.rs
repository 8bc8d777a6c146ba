// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Declarations of the byte functions a glue table expects.

use crate::abi;

/// How a byte function reports its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returns {
    /// Always produces bytes
    Bytes,
    /// May set the error flag and return a message instead
    Fallible,
}

impl Returns {
    /// Bytes the callee writes at `retptr`.
    #[must_use]
    pub const fn return_area_size(self) -> usize {
        match self {
            Self::Bytes => abi::BYTES_RETURN_AREA_SIZE,
            Self::Fallible => abi::FALLIBLE_RETURN_AREA_SIZE,
        }
    }
}

/// Name and shape of one exported byte function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSignature {
    /// Export name in the module
    pub name:    &'static str,
    /// Number of byte-slice arguments
    pub arity:   usize,
    /// Result convention
    pub returns: Returns,
}

impl ExportSignature {
    /// Infallible byte function.
    #[must_use]
    pub const fn bytes(name: &'static str, arity: usize) -> Self {
        Self {
            name,
            arity,
            returns: Returns::Bytes,
        }
    }

    /// Byte function that may report a guest error.
    #[must_use]
    pub const fn fallible(name: &'static str, arity: usize) -> Self {
        Self {
            name,
            arity,
            returns: Returns::Fallible,
        }
    }

    /// Number of core wasm parameters, return pointer included.
    #[must_use]
    pub const fn param_count(&self) -> usize {
        abi::param_count(self.arity)
    }

    /// Whether the guest may report an error.
    #[must_use]
    pub const fn is_fallible(&self) -> bool {
        matches!(self.returns, Returns::Fallible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_constructors() {
        let hash = ExportSignature::bytes("blake3_hash_once", 1);
        assert_eq!(hash.param_count(), 3);
        assert!(!hash.is_fallible());

        let encrypt = ExportSignature::fallible("encrypt_xsalsa20", 3);
        assert_eq!(encrypt.param_count(), 7);
        assert!(encrypt.is_fallible());
        assert_eq!(encrypt.returns.return_area_size(), 16);
        assert_eq!(hash.returns.return_area_size(), 8);
    }
}
