// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![allow(clippy::unwrap_used)]
//! Failed initializations and the failure policies.

mod common;

use std::sync::Arc;

use wasmbridge::{Bridge, BridgeOptions, DataUri, FailurePolicy, InitState, PayloadSource};
use wasmbridge_error::codes;

fn options(failure_policy: FailurePolicy) -> BridgeOptions {
    BridgeOptions {
        failure_policy,
        ..BridgeOptions::default()
    }
}

#[tokio::test]
async fn test_corrupted_embedded_payload_leaves_nothing_callable() {
    let mut uri = common::data_uri();
    uri.push('!');
    let bridge = Bridge::with_source(PayloadSource::Embedded(uri.into()), BridgeOptions::default());

    let error = bridge.initialize().await.unwrap_err();
    assert!(error.is_payload_unavailable());
    assert_eq!(error.code, codes::INVALID_BASE64);
    assert!(bridge.exports().unwrap_err().is_use_before_init());
    assert_eq!(bridge.stats().instantiations, 0);
}

#[tokio::test]
async fn test_invalid_module_fails_instantiation() {
    let uri = DataUri::encode(b"\0asm\x02\0\0\0garbage");
    let bridge = Bridge::with_source(PayloadSource::Embedded(uri.into()), BridgeOptions::default());

    let error = bridge.initialize().await.unwrap_err();
    assert!(error.is_instantiation_failed());
    assert_eq!(error.code, codes::COMPILATION_FAILED);
}

#[tokio::test]
async fn test_module_without_crypto_exports_fails_binding() {
    let bytes = wat::parse_str(
        r#"(module
             (memory (export "memory") 1)
             (func (export "__wbindgen_malloc") (param i32 i32) (result i32) (i32.const 0))
             (func (export "__wbindgen_free") (param i32 i32 i32))
             (func (export "__wbindgen_add_to_stack_pointer") (param i32) (result i32) (i32.const 0)))"#,
    )
    .unwrap();
    let bridge = Bridge::with_source(
        PayloadSource::Embedded(DataUri::encode(&bytes).into()),
        BridgeOptions::default(),
    );

    let error = bridge.initialize().await.unwrap_err();
    assert_eq!(error.code, codes::MISSING_EXPORT);
    assert!(error.message.contains("blake3_hash_once"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failure_reaches_every_concurrent_caller() {
    let dir = tempfile::tempdir().unwrap();
    let source = PayloadSource::FileSystemPath(dir.path().join("module.wasm"));
    let bridge = Arc::new(Bridge::with_source(source, options(FailurePolicy::Retry)));

    let mut handles = Vec::new();
    for _ in 0..8 {
        let bridge = Arc::clone(&bridge);
        handles.push(tokio::spawn(async move { bridge.initialize().await }));
    }
    for handle in handles {
        let error = handle.await.unwrap().unwrap_err();
        assert_eq!(error.code, codes::PAYLOAD_READ_FAILED);
    }
}

#[tokio::test]
async fn test_retry_policy_allows_later_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("module.wasm");
    let bridge = Bridge::with_source(
        PayloadSource::FileSystemPath(path.clone()),
        options(FailurePolicy::Retry),
    );

    assert!(bridge.initialize().await.is_err());
    assert_eq!(bridge.state(), InitState::Uninitialized);

    std::fs::write(&path, common::module_bytes()).unwrap();
    let exports = bridge.initialize().await.unwrap();
    assert!(exports.blake3_hash_once(b"Hello, World!").is_ok());
    assert_eq!(bridge.stats().payload_fetches, 2);
    assert_eq!(bridge.stats().instantiations, 1);
}

#[tokio::test]
async fn test_cache_policy_keeps_failure() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("module.wasm");
    let bridge = Bridge::with_source(
        PayloadSource::FileSystemPath(path.clone()),
        options(FailurePolicy::Cache),
    );

    let first = bridge.initialize().await.unwrap_err();
    assert_eq!(bridge.state(), InitState::Failed);

    std::fs::write(&path, common::module_bytes()).unwrap();
    let second = bridge.initialize().await.unwrap_err();
    assert_eq!(first, second);
    assert_eq!(bridge.stats().payload_fetches, 1);
    assert!(bridge.exports().unwrap_err().is_use_before_init());
}
