// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The wasmbridge `Error` type and its categories.
//!
//! An `Error` is cheap to clone so that one initialization failure can be
//! handed, unchanged, to every caller that was waiting on it.

use std::{borrow::Cow, fmt};

use crate::codes;

/// `Error` categories for wasmbridge operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorCategory {
    /// The module bytes could not be produced
    Payload        = 1,
    /// The engine rejected the module
    Instantiation  = 2,
    /// The instance could not be wired into the glue table
    Binding        = 3,
    /// Initialization lifecycle violations
    Initialization = 4,
    /// Errors raised while calling an exported function
    Invocation     = 5,
    /// Configuration errors
    Configuration  = 6,
    /// Async runtime and task errors
    Concurrency    = 7,
}

impl ErrorCategory {
    /// Short lowercase name, used in log fields
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Payload => "payload",
            Self::Instantiation => "instantiation",
            Self::Binding => "binding",
            Self::Initialization => "initialization",
            Self::Invocation => "invocation",
            Self::Configuration => "configuration",
            Self::Concurrency => "concurrency",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// wasmbridge `Error` type
///
/// Categorised error with a numeric code and a message. Messages are
/// `'static` where possible and owned where they carry context such as a
/// file path or a guest trap description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// `Error` category
    pub category: ErrorCategory,
    /// `Error` code
    pub code:     u16,
    /// `Error` message
    pub message:  Cow<'static, str>,
}

impl Error {
    /// Exported function called before the module was bound
    pub const USE_BEFORE_INIT: Self = Self::new(
        ErrorCategory::Initialization,
        codes::USE_BEFORE_INIT,
        "Exported function called before initialization completed",
    );
    /// Initialization task ended without publishing an outcome
    pub const INITIALIZATION_ABANDONED: Self = Self::new(
        ErrorCategory::Initialization,
        codes::INITIALIZATION_ABANDONED,
        "Initialization task ended without an outcome",
    );
    /// No tokio runtime on the calling thread
    pub const NO_ASYNC_RUNTIME: Self = Self::new(
        ErrorCategory::Concurrency,
        codes::NO_ASYNC_RUNTIME,
        "Initialization requires a tokio runtime",
    );
    /// Embedded payload decoded to nothing
    pub const EMPTY_PAYLOAD: Self = Self::new(
        ErrorCategory::Payload,
        codes::EMPTY_PAYLOAD,
        "Payload is empty",
    );

    /// Create a new error with a static message.
    #[must_use]
    pub const fn new(category: ErrorCategory, code: u16, message: &'static str) -> Self {
        Self {
            category,
            code,
            message: Cow::Borrowed(message),
        }
    }

    /// Create a new error with an owned message.
    #[must_use]
    pub fn with_message(category: ErrorCategory, code: u16, message: impl Into<String>) -> Self {
        Self {
            category,
            code,
            message: Cow::Owned(message.into()),
        }
    }

    /// Returns a copy of this error with `context` prepended to the message.
    #[must_use]
    pub fn context(&self, context: &str) -> Self {
        Self::with_message(self.category, self.code, format!("{context}: {}", self.message))
    }

    /// The bytes of the module could not be produced.
    #[must_use]
    pub fn is_payload_unavailable(&self) -> bool {
        self.category == ErrorCategory::Payload
    }

    /// The module was rejected, or could not be bound to the glue table.
    #[must_use]
    pub fn is_instantiation_failed(&self) -> bool {
        matches!(
            self.category,
            ErrorCategory::Instantiation | ErrorCategory::Binding
        )
    }

    /// An exported function was used before the module was ready.
    #[must_use]
    pub fn is_use_before_init(&self) -> bool {
        self.code == codes::USE_BEFORE_INIT
    }

    /// Check if this is an invocation error
    #[must_use]
    pub fn is_invocation_error(&self) -> bool {
        self.category == ErrorCategory::Invocation
    }

    /// Check if this is a configuration error
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        self.category == ErrorCategory::Configuration
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}][E{:04}] {}", self.category, self.code, self.message)
    }
}

impl std::error::Error for Error {}
