// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]

//! Glue binding layer for wasmbridge.
//!
//! This crate wires a compiled module to the host over wasmtime, following
//! the calling convention described in [`abi`]: byte slices travel through
//! guest memory, results come back through a return area on the guest
//! shadow stack.
//!
//! ## Features
//!
//! - Instantiation with host-provided `__wbindgen_throw` and trapping stubs
//!   for any other import
//! - Validation of expected exports against the calling convention
//! - A one-shot post-bind start routine
//! - Thread-safe calls on the bound instance
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wasmbridge_host::{ExportSignature, GlueTable, ModuleInstance, StartRoutine};
//!
//! # fn demo(bytes: &[u8]) -> wasmbridge_error::Result<()> {
//! let engine = wasmtime::Engine::default();
//! let instance = ModuleInstance::instantiate(&engine, bytes)?;
//! let glue = GlueTable::new(&[ExportSignature::bytes("blake3_hash_once", 1)])
//!     .with_start(Some(StartRoutine::default()))
//!     .bind(instance)?;
//! let digest: [u8; 32] = glue.call_fixed("blake3_hash_once", &[b"Hello, World!"])?;
//! # let _ = digest;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod abi;
pub mod function;
pub mod glue;
pub mod instance;

pub use function::{ExportSignature, Returns};
pub use glue::{BoundGlue, GlueTable, StartRoutine};
pub use instance::{ModuleInstance, RawOutput};
