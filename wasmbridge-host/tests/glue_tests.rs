// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![allow(clippy::unwrap_used)]
//! Binding and calling the glue fixture module.

use wasmbridge_error::{codes, ErrorCategory};
use wasmbridge_host::{BoundGlue, ExportSignature, GlueTable, ModuleInstance, StartRoutine};
use wasmtime::Engine;

const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/glue_fixture.wat");

const SIGNATURES: &[ExportSignature] = &[
    ExportSignature::bytes("reverse", 1),
    ExportSignature::bytes("concat", 2),
    ExportSignature::fallible("fail", 1),
    ExportSignature::fallible("checked", 1),
    ExportSignature::bytes("oversized", 0),
    ExportSignature::bytes("throws", 0),
    ExportSignature::bytes("was_started", 0),
    ExportSignature::bytes("stack_pointer", 0),
    ExportSignature::bytes("clock", 0),
];

fn instance() -> ModuleInstance {
    let bytes = wat::parse_file(FIXTURE).unwrap();
    ModuleInstance::instantiate(&Engine::default(), &bytes).unwrap()
}

fn bound() -> BoundGlue {
    GlueTable::new(SIGNATURES)
        .with_start(Some(StartRoutine::default()))
        .bind(instance())
        .unwrap()
}

#[test]
fn test_start_routine_runs_before_first_call() {
    let glue = bound();
    assert_eq!(glue.call("was_started", &[]).unwrap(), [1]);
}

#[test]
fn test_binding_without_start() {
    let glue = GlueTable::new(SIGNATURES).bind(instance()).unwrap();
    assert_eq!(glue.call("was_started", &[]).unwrap(), [0]);
}

#[test]
fn test_bytes_round_trip_through_guest_memory() {
    let glue = bound();
    assert_eq!(glue.call("reverse", &[b"abc"]).unwrap(), b"cba");
    assert_eq!(glue.call("reverse", &[b""]).unwrap(), b"");
    assert_eq!(glue.call("concat", &[b"Hello, ", b"World!"]).unwrap(), b"Hello, World!");
}

#[test]
fn test_large_argument_grows_guest_memory() {
    let glue = bound();
    let input: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
    let output = glue.call("reverse", &[&input]).unwrap();
    assert_eq!(output.len(), input.len());
    assert_eq!(output.first(), input.last());
}

#[test]
fn test_guest_error_carries_message() {
    let error = bound().call("fail", &[b"x"]).unwrap_err();
    assert_eq!(error.code, codes::GUEST_ERROR);
    assert_eq!(error.category, ErrorCategory::Invocation);
    assert!(error.message.contains("echo failed"));
}

#[test]
fn test_infallible_export_ignores_stale_stack_words() {
    let glue = bound();
    // leaves a set error flag and error slot in the reserved return area
    assert!(glue.call("fail", &[b"x"]).is_err());
    assert_eq!(glue.call("reverse", &[b"abc"]).unwrap(), b"cba");
    assert_eq!(glue.call("concat", &[b"di", b"gest"]).unwrap(), b"digest");
}

#[test]
fn test_fallible_export_reads_flag_not_error_slot() {
    let glue = bound();
    assert_eq!(glue.call("checked", &[b"payload"]).unwrap(), b"payload");

    let error = glue.call("checked", &[b""]).unwrap_err();
    assert_eq!(error.code, codes::GUEST_ERROR);
    assert!(error.message.contains("empty input"), "{error}");
}

#[test]
fn test_output_outside_guest_memory_is_rejected() {
    let glue = bound();
    let error = glue.call("oversized", &[]).unwrap_err();
    assert_eq!(error.code, codes::MEMORY_ACCESS_ERROR);
    assert!(error.is_invocation_error());
    assert_eq!(glue.call("reverse", &[b"ok"]).unwrap(), b"ko");
}

#[test]
fn test_guest_throw_traps_with_message() {
    let error = bound().call("throws", &[]).unwrap_err();
    assert_eq!(error.code, codes::GUEST_TRAP);
    assert!(error.message.contains("guest threw"), "{error}");
}

#[test]
fn test_unknown_import_traps_when_called() {
    let error = bound().call("clock", &[]).unwrap_err();
    assert_eq!(error.code, codes::GUEST_TRAP);
}

#[test]
fn test_stack_pointer_restored_after_trap() {
    let glue = bound();
    let before = glue.call("stack_pointer", &[]).unwrap();
    assert!(glue.call("throws", &[]).is_err());
    assert!(glue.call("fail", &[b"x"]).is_err());
    let after = glue.call("stack_pointer", &[]).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_fixed_length_output() {
    let glue = bound();
    let reversed: [u8; 3] = glue.call_fixed("reverse", &[b"abc"]).unwrap();
    assert_eq!(&reversed, b"cba");

    let error = glue.call_fixed::<4>("reverse", &[b"abc"]).unwrap_err();
    assert_eq!(error.code, codes::UNEXPECTED_OUTPUT_LENGTH);
}

#[test]
fn test_undeclared_export_and_arity() {
    let glue = bound();
    assert_eq!(glue.call("bad_shape", &[]).unwrap_err().code, codes::UNKNOWN_EXPORT);
    assert_eq!(glue.call("reverse", &[]).unwrap_err().code, codes::ARITY_MISMATCH);
}

#[test]
fn test_missing_export_fails_binding() {
    let table = GlueTable::new(&[ExportSignature::bytes("blake3_hash_once", 1)]);
    let error = table.bind(instance()).unwrap_err();
    assert_eq!(error.code, codes::MISSING_EXPORT);
    assert!(error.is_instantiation_failed());
}

#[test]
fn test_wrong_shape_fails_binding() {
    let table = GlueTable::new(&[ExportSignature::bytes("bad_shape", 0)]);
    let error = table.bind(instance()).unwrap_err();
    assert_eq!(error.code, codes::EXPORT_SIGNATURE_MISMATCH);

    let table = GlueTable::new(&[ExportSignature::bytes("concat", 1)]);
    assert_eq!(table.bind(instance()).unwrap_err().code, codes::EXPORT_SIGNATURE_MISMATCH);
}

#[test]
fn test_required_start_routine_must_exist() {
    let error = GlueTable::new(SIGNATURES)
        .with_start(Some(StartRoutine::named("__custom_start")))
        .bind(instance())
        .unwrap_err();
    assert_eq!(error.code, codes::START_ROUTINE_FAILED);
}

#[test]
fn test_module_without_runtime_exports() {
    let bytes = wat::parse_str(r#"(module (memory (export "memory") 1))"#).unwrap();
    let error = ModuleInstance::instantiate(&Engine::default(), &bytes).unwrap_err();
    assert_eq!(error.code, codes::MISSING_EXPORT);
    assert_eq!(error.category, ErrorCategory::Binding);
}

#[test]
fn test_export_introspection() {
    let glue = bound();
    assert_eq!(glue.export_names().len(), SIGNATURES.len());
    let module_exports = glue.module_exports();
    assert!(module_exports.iter().any(|e| e == "memory"));
    assert!(module_exports.iter().any(|e| e == "__wbindgen_start"));
}
