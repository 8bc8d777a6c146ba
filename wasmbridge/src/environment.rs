// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Deciding which delivery environment the host is running in.
//!
//! A browser-like environment receives the module embedded in the
//! distributable; a file-system environment reads it from a co-located file.
//! The decision hinges on a marker: in a Rust host, a process environment
//! variable.

use tracing::debug;

/// Default marker variable.
pub const DEFAULT_MARKER: &str = "WASMBRIDGE_BROWSER";

/// Delivery environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Marker present: use the embedded payload
    BrowserLike,
    /// Marker absent: read the payload file
    FileSystem,
}

/// Source of truth for the environment marker.
pub trait EnvironmentProbe: Send + Sync {
    /// Whether `marker` is defined.
    fn has_marker(&self, marker: &str) -> bool;
}

/// Looks the marker up in the process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentProbe for ProcessEnvironment {
    fn has_marker(&self, marker: &str) -> bool {
        std::env::var_os(marker).is_some()
    }
}

/// Classifies the environment through `probe`.
pub fn detect(probe: &dyn EnvironmentProbe, marker: &str) -> Environment {
    let environment = if probe.has_marker(marker) {
        Environment::BrowserLike
    } else {
        Environment::FileSystem
    };
    debug!(marker, ?environment, "environment detected");
    environment
}
