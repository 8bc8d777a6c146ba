// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

#![forbid(unsafe_code)]

//! Load a precompiled crypto module once and call its exports.
//!
//! wasmbridge takes the bytes of a wasm-bindgen style module from wherever
//! they happen to be (an embedded data URI, a file next to the binary, bytes
//! linked in with `include_bytes!`, or a URL), instantiates the module exactly
//! once no matter how many tasks ask for it, binds its glue table and hands
//! out typed functions.
//!
//! ## Features
//!
//! - Single-flight initialization with a configurable failure policy
//! - Payload strategies with environment detection
//! - TOML configuration
//! - An explicit [`Bridge`] context and a process-wide [`global`] surface
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wasmbridge::{Bridge, BridgeOptions, PayloadSource};
//!
//! # async fn demo() -> wasmbridge::Result<()> {
//! let bridge = Bridge::with_source(
//!     PayloadSource::FileSystemPath("pkg/module.wasm".into()),
//!     BridgeOptions::default(),
//! );
//! let exports = bridge.initialize().await?;
//! let digest = exports.blake3_hash_once(b"Hello, World!")?;
//! assert_eq!(digest.len(), 32);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod bridge;
pub mod config;
pub mod environment;
pub mod exports;
pub mod global;
pub mod level;
pub mod payload;

pub use bridge::{Bridge, BridgeOptions, BridgeStats};
pub use config::BridgeConfig;
pub use environment::{Environment, EnvironmentProbe, ProcessEnvironment};
pub use exports::{Exports, SIGNATURES};
pub use level::LogLevel;
pub use payload::{DataUri, EmbeddedPayload, PayloadSource};
pub use wasmbridge_error::{Error, ErrorCategory, Result};
pub use wasmbridge_host::StartRoutine;
pub use wasmbridge_sync::{FailurePolicy, InitState};
