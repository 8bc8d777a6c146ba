// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Synchronization primitives for wasmbridge.
//!
//! The only primitive today is [`SingleFlight`], an asynchronous run-once
//! cell. Concurrent callers share a single in-flight initialization and all
//! observe its outcome.
//!
//! ```
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! use wasmbridge_sync::{FailurePolicy, InitState, SingleFlight};
//!
//! let cell = SingleFlight::new(FailurePolicy::Retry);
//! let value = cell.get_or_try_init(|| async { Ok(42_u32) }).await;
//! assert_eq!(value.map(|v| *v), Ok(42));
//! assert_eq!(cell.state(), InitState::Initialized);
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Asynchronous run-once initialization
pub mod single_flight;

pub use single_flight::{FailurePolicy, InitState, SingleFlight};
