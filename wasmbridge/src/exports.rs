// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The functions exported by the crypto module.
//!
//! Names match the module's exports one to one. Every function is pure over
//! its byte arguments and runs synchronously on the bound instance.

use wasmbridge_error::Result;
use wasmbridge_host::{BoundGlue, ExportSignature};

/// Length of a BLAKE3 digest
pub const DIGEST_LEN: usize = 32;
/// Length of a derived XSalsa20 nonce
pub const NONCE_LEN: usize = 24;

/// Export names
pub mod names {
    /// `blake3_hash_once(data) -> [u8; 32]`
    pub const BLAKE3_HASH_ONCE: &str = "blake3_hash_once";
    /// `blake3_hash_once_with_context(data, context) -> [u8; 32]`
    pub const BLAKE3_HASH_ONCE_WITH_CONTEXT: &str = "blake3_hash_once_with_context";
    /// `generate_nonce(nonce_material) -> [u8; 24]`
    pub const GENERATE_NONCE: &str = "generate_nonce";
    /// `blake3_empty_state() -> state`
    pub const BLAKE3_EMPTY_STATE: &str = "blake3_empty_state";
    /// `blake3_update_state(state, data) -> state`
    pub const BLAKE3_UPDATE_STATE: &str = "blake3_update_state";
    /// `blake3_digest_for_state(state) -> [u8; 32]`
    pub const BLAKE3_DIGEST_FOR_STATE: &str = "blake3_digest_for_state";
    /// `encrypt_xsalsa20(key, nonce_material, plaintext) -> ciphertext`
    pub const ENCRYPT_XSALSA20: &str = "encrypt_xsalsa20";
    /// `decrypt_xsalsa20(key, nonce_material, ciphertext) -> plaintext`
    pub const DECRYPT_XSALSA20: &str = "decrypt_xsalsa20";
}

/// Glue table of the crypto module.
pub const SIGNATURES: &[ExportSignature] = &[
    ExportSignature::bytes(names::BLAKE3_HASH_ONCE, 1),
    ExportSignature::bytes(names::BLAKE3_HASH_ONCE_WITH_CONTEXT, 2),
    ExportSignature::bytes(names::GENERATE_NONCE, 1),
    ExportSignature::bytes(names::BLAKE3_EMPTY_STATE, 0),
    ExportSignature::bytes(names::BLAKE3_UPDATE_STATE, 2),
    ExportSignature::bytes(names::BLAKE3_DIGEST_FOR_STATE, 1),
    ExportSignature::fallible(names::ENCRYPT_XSALSA20, 3),
    ExportSignature::fallible(names::DECRYPT_XSALSA20, 3),
];

/// Typed access to a bound crypto module.
#[derive(Debug)]
pub struct Exports {
    glue: BoundGlue,
}

impl Exports {
    pub(crate) fn new(glue: BoundGlue) -> Self {
        Self { glue }
    }

    /// BLAKE3 digest of `data`.
    ///
    /// # Errors
    ///
    /// `Invocation` errors if the guest traps or returns a digest of the wrong
    /// length.
    pub fn blake3_hash_once(&self, data: &[u8]) -> Result<[u8; DIGEST_LEN]> {
        self.glue.call_fixed(names::BLAKE3_HASH_ONCE, &[data])
    }

    /// BLAKE3 digest of `data` keyed by `context`.
    ///
    /// # Errors
    ///
    /// As [`Exports::blake3_hash_once`].
    pub fn blake3_hash_once_with_context(
        &self,
        data: &[u8],
        context: &[u8],
    ) -> Result<[u8; DIGEST_LEN]> {
        self.glue
            .call_fixed(names::BLAKE3_HASH_ONCE_WITH_CONTEXT, &[data, context])
    }

    /// Nonce derived from `nonce_material`.
    ///
    /// # Errors
    ///
    /// As [`Exports::blake3_hash_once`].
    pub fn generate_nonce(&self, nonce_material: &[u8]) -> Result<[u8; NONCE_LEN]> {
        self.glue.call_fixed(names::GENERATE_NONCE, &[nonce_material])
    }

    /// Fresh incremental hashing state.
    ///
    /// # Errors
    ///
    /// `GUEST_TRAP` if the guest traps.
    pub fn blake3_empty_state(&self) -> Result<Vec<u8>> {
        self.glue.call(names::BLAKE3_EMPTY_STATE, &[])
    }

    /// `state` extended with `data`.
    ///
    /// # Errors
    ///
    /// `GUEST_TRAP` if the guest traps.
    pub fn blake3_update_state(&self, state: &[u8], data: &[u8]) -> Result<Vec<u8>> {
        self.glue.call(names::BLAKE3_UPDATE_STATE, &[state, data])
    }

    /// Digest of everything fed into `state`.
    ///
    /// # Errors
    ///
    /// As [`Exports::blake3_hash_once`].
    pub fn blake3_digest_for_state(&self, state: &[u8]) -> Result<[u8; DIGEST_LEN]> {
        self.glue.call_fixed(names::BLAKE3_DIGEST_FOR_STATE, &[state])
    }

    /// Encrypts `plaintext` with a 32-byte `key` and a nonce derived from
    /// `nonce_material`. No authentication.
    ///
    /// # Errors
    ///
    /// `GUEST_ERROR` with the guest's message for an invalid key.
    pub fn encrypt_xsalsa20(
        &self,
        key: &[u8],
        nonce_material: &[u8],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        self.glue
            .call(names::ENCRYPT_XSALSA20, &[key, nonce_material, plaintext])
    }

    /// Inverse of [`Exports::encrypt_xsalsa20`].
    ///
    /// # Errors
    ///
    /// `GUEST_ERROR` with the guest's message for an invalid key.
    pub fn decrypt_xsalsa20(
        &self,
        key: &[u8],
        nonce_material: &[u8],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        self.glue
            .call(names::DECRYPT_XSALSA20, &[key, nonce_material, ciphertext])
    }

    /// Names of the exported functions.
    #[must_use]
    pub fn export_names(&self) -> Vec<&'static str> {
        self.glue.export_names()
    }

    /// Every export of the module, runtime exports included.
    #[must_use]
    pub fn module_exports(&self) -> Vec<String> {
        self.glue.module_exports()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_table_is_unique() {
        for (i, a) in SIGNATURES.iter().enumerate() {
            assert!(SIGNATURES[i + 1..].iter().all(|b| b.name != a.name), "{}", a.name);
        }
    }

    #[test]
    fn test_only_cipher_functions_are_fallible() {
        let fallible: Vec<_> = SIGNATURES
            .iter()
            .filter(|s| s.is_fallible())
            .map(|s| s.name)
            .collect();
        assert_eq!(fallible, [names::ENCRYPT_XSALSA20, names::DECRYPT_XSALSA20]);
    }
}
