// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![allow(clippy::unwrap_used)]
//! Integration tests for the wasmbridge-error crate.

#[cfg(test)]
mod tests {
    use wasmbridge_error::{codes, kinds, Error, ErrorCategory, Result};

    #[test]
    fn test_error_creation() {
        let error = Error::new(ErrorCategory::Payload, codes::INVALID_BASE64, "bad base64");
        assert!(error.is_payload_unavailable());
        assert_eq!(error.code, codes::INVALID_BASE64);
    }

    #[test]
    fn test_result_with_error() {
        let result: Result<[u8; 32]> = Err(kinds::use_before_init("blake3_hash_once"));
        let error = result.err().unwrap();
        assert!(error.is_use_before_init());
        assert_eq!(error.category, ErrorCategory::Initialization);
    }

    #[test]
    fn test_error_is_std_error() {
        fn describe(error: &dyn std::error::Error) -> String {
            error.to_string()
        }

        let error = kinds::instantiation_failed(codes::COMPILATION_FAILED, "magic header not detected");
        assert!(describe(&error).contains("magic header not detected"));
    }

    #[test]
    fn test_code_ranges_per_category() {
        let samples = [
            (kinds::payload_unavailable(codes::PAYLOAD_READ_FAILED, "x"), 1000..2000),
            (kinds::instantiation_failed(codes::INSTANTIATION_FAILED, "x"), 2000..3000),
            (kinds::binding_error(codes::START_ROUTINE_FAILED, "x"), 2000..3000),
            (kinds::use_before_init("f"), 3000..4000),
            (kinds::invocation_error(codes::GUEST_ERROR, "x"), 4000..5000),
            (kinds::config_error(codes::CONFIG_PARSE_ERROR, "x"), 5000..6000),
        ];
        for (error, range) in samples {
            assert!(range.contains(&error.code), "{error} outside {range:?}");
        }
    }
}
