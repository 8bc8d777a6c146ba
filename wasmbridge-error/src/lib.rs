// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! wasmbridge error handling library
//!
//! Every fallible operation in the workspace returns [`Result`] with the
//! categorised [`Error`] defined here.
//!
//! # Error Categories
//!
//! ## Payload Errors (1001-1006)
//! - Missing or unreadable payload file
//! - Malformed embedded `data:` URI
//! - Network fetch failures
//!
//! ## Instantiation and Binding Errors (2000-2005)
//! - Compilation and instantiation failures
//! - Missing or mistyped glue exports
//! - Start routine failures
//!
//! ## Initialization Errors (3000-3003)
//! - Use before initialization
//! - Abandoned initialization tasks
//!
//! ## Invocation Errors (4000-4006)
//! - Guest traps and guest-reported errors
//! - Output length mismatches
//!
//! ## Configuration Errors (5000-5004)
//! - Unreadable or invalid configuration files
//! - Engine settings wasmtime rejects
//!
//! # Usage
//!
//! ```
//! use wasmbridge_error::{codes, kinds, Error, ErrorCategory};
//!
//! let error = Error::new(
//!     ErrorCategory::Payload,
//!     codes::MALFORMED_DATA_URI,
//!     "Embedded payload is not a data URI",
//! );
//! assert!(error.is_payload_unavailable());
//!
//! let early = kinds::use_before_init("blake3_hash_once");
//! assert!(early.is_use_before_init());
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Error codes for wasmbridge
pub mod codes;
/// Error and error handling types
pub mod errors;
/// Error kind constructors
pub mod kinds;

pub use errors::{Error, ErrorCategory};

/// A specialized `Result` type for wasmbridge operations.
pub type Result<T> = core::result::Result<T, Error>;
