// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![allow(dead_code, clippy::unwrap_used)]
//! Shared helpers for the wasmbridge integration tests.

use wasmbridge::{Bridge, BridgeOptions, DataUri, PayloadSource};

/// Text form of the crypto stand-in module
pub const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/crypto_fixture.wat");

/// Compiled fixture bytes
pub fn module_bytes() -> Vec<u8> {
    wat::parse_file(FIXTURE).unwrap()
}

/// Fixture as an embedded data URI
pub fn data_uri() -> String {
    DataUri::encode(&module_bytes())
}

/// Bridge over the embedded fixture
pub fn embedded_bridge(options: BridgeOptions) -> Bridge {
    Bridge::with_source(PayloadSource::Embedded(data_uri().into()), options)
}

/// Fixture bytes with a `'static` lifetime, as `include_bytes!` would give
pub fn static_bytes() -> &'static [u8] {
    Box::leak(module_bytes().into_boxed_slice())
}
