// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Process-wide surface over one installed [`Bridge`].
//!
//! Consumers that want a single module per process call [`initialize`] once
//! and then the free functions below. [`install`] picks the bridge; without
//! it the first [`initialize`] builds one from [`BridgeConfig::from_env`].
//! Nothing initializes implicitly: every free function fails with
//! `UseBeforeInit` until [`initialize`] has succeeded.

use std::sync::{Arc, OnceLock};

use wasmbridge_error::{codes, kinds, Error, ErrorCategory, Result};
use wasmbridge_sync::InitState;

use crate::{
    bridge::Bridge,
    config::BridgeConfig,
    exports::{names, Exports, DIGEST_LEN, NONCE_LEN},
};

static BRIDGE: OnceLock<Bridge> = OnceLock::new();

/// Installs `bridge` as the process-wide bridge.
///
/// # Errors
///
/// `ALREADY_INSTALLED` if a bridge is already in place, including one built
/// by an earlier [`initialize`].
pub fn install(bridge: Bridge) -> Result<()> {
    BRIDGE.set(bridge).map_err(|_| {
        Error::new(
            ErrorCategory::Initialization,
            codes::ALREADY_INSTALLED,
            "a process-wide bridge is already installed",
        )
    })
}

/// Initializes the process-wide bridge. Safe to call any number of times,
/// concurrently or not.
///
/// # Errors
///
/// Configuration errors when no bridge was installed and the environment
/// configuration is invalid, otherwise as [`Bridge::initialize`].
pub async fn initialize() -> Result<()> {
    let bridge = match BRIDGE.get() {
        Some(bridge) => bridge,
        None => {
            let config = BridgeConfig::from_env()?;
            let candidate = Bridge::new(&config)?;
            // Losing the race leaves the other caller's bridge in place.
            let _ = BRIDGE.set(candidate);
            BRIDGE.get().ok_or(Error::INITIALIZATION_ABANDONED)?
        },
    };
    bridge.initialize().await.map(|_| ())
}

/// The installed bridge, if any.
#[must_use]
pub fn bridge() -> Option<&'static Bridge> {
    BRIDGE.get()
}

/// Lifecycle state of the process-wide bridge.
#[must_use]
pub fn state() -> InitState {
    BRIDGE.get().map_or(InitState::Uninitialized, Bridge::state)
}

fn ready(function: &str) -> Result<Arc<Exports>> {
    BRIDGE
        .get()
        .and_then(|bridge| bridge.exports().ok())
        .ok_or_else(|| kinds::use_before_init(function))
}

/// See [`Exports::blake3_hash_once`].
///
/// # Errors
///
/// `USE_BEFORE_INIT` before [`initialize`] has succeeded.
pub fn blake3_hash_once(data: &[u8]) -> Result<[u8; DIGEST_LEN]> {
    ready(names::BLAKE3_HASH_ONCE)?.blake3_hash_once(data)
}

/// See [`Exports::blake3_hash_once_with_context`].
///
/// # Errors
///
/// `USE_BEFORE_INIT` before [`initialize`] has succeeded.
pub fn blake3_hash_once_with_context(data: &[u8], context: &[u8]) -> Result<[u8; DIGEST_LEN]> {
    ready(names::BLAKE3_HASH_ONCE_WITH_CONTEXT)?.blake3_hash_once_with_context(data, context)
}

/// See [`Exports::generate_nonce`].
///
/// # Errors
///
/// `USE_BEFORE_INIT` before [`initialize`] has succeeded.
pub fn generate_nonce(nonce_material: &[u8]) -> Result<[u8; NONCE_LEN]> {
    ready(names::GENERATE_NONCE)?.generate_nonce(nonce_material)
}

/// See [`Exports::blake3_empty_state`].
///
/// # Errors
///
/// `USE_BEFORE_INIT` before [`initialize`] has succeeded.
pub fn blake3_empty_state() -> Result<Vec<u8>> {
    ready(names::BLAKE3_EMPTY_STATE)?.blake3_empty_state()
}

/// See [`Exports::blake3_update_state`].
///
/// # Errors
///
/// `USE_BEFORE_INIT` before [`initialize`] has succeeded.
pub fn blake3_update_state(state: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    ready(names::BLAKE3_UPDATE_STATE)?.blake3_update_state(state, data)
}

/// See [`Exports::blake3_digest_for_state`].
///
/// # Errors
///
/// `USE_BEFORE_INIT` before [`initialize`] has succeeded.
pub fn blake3_digest_for_state(state: &[u8]) -> Result<[u8; DIGEST_LEN]> {
    ready(names::BLAKE3_DIGEST_FOR_STATE)?.blake3_digest_for_state(state)
}

/// See [`Exports::encrypt_xsalsa20`].
///
/// # Errors
///
/// `USE_BEFORE_INIT` before [`initialize`] has succeeded, otherwise as the
/// export.
pub fn encrypt_xsalsa20(key: &[u8], nonce_material: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    ready(names::ENCRYPT_XSALSA20)?.encrypt_xsalsa20(key, nonce_material, plaintext)
}

/// See [`Exports::decrypt_xsalsa20`].
///
/// # Errors
///
/// `USE_BEFORE_INIT` before [`initialize`] has succeeded, otherwise as the
/// export.
pub fn decrypt_xsalsa20(key: &[u8], nonce_material: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    ready(names::DECRYPT_XSALSA20)?.decrypt_xsalsa20(key, nonce_material, ciphertext)
}
