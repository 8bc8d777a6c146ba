// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Constructor helpers for the errors raised across the workspace.

use crate::{codes, Error, ErrorCategory};

/// Payload bytes could not be produced.
#[must_use]
pub fn payload_unavailable(code: u16, message: impl Into<String>) -> Error {
    Error::with_message(ErrorCategory::Payload, code, message)
}

/// The engine rejected the module at compile or instantiation time.
#[must_use]
pub fn instantiation_failed(code: u16, message: impl Into<String>) -> Error {
    Error::with_message(ErrorCategory::Instantiation, code, message)
}

/// The instance does not satisfy the glue table.
#[must_use]
pub fn binding_error(code: u16, message: impl Into<String>) -> Error {
    Error::with_message(ErrorCategory::Binding, code, message)
}

/// `function` was called before the module was ready.
#[must_use]
pub fn use_before_init(function: &str) -> Error {
    Error::with_message(
        ErrorCategory::Initialization,
        codes::USE_BEFORE_INIT,
        format!("`{function}` called before initialization completed"),
    )
}

/// Error raised while running an exported function.
#[must_use]
pub fn invocation_error(code: u16, message: impl Into<String>) -> Error {
    Error::with_message(ErrorCategory::Invocation, code, message)
}

/// Configuration error.
#[must_use]
pub fn config_error(code: u16, message: impl Into<String>) -> Error {
    Error::with_message(ErrorCategory::Configuration, code, message)
}
