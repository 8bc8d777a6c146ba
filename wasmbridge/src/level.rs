// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Log level definitions for wasmbridge.
//!
//! The level is read from configuration or the command line and turned into a
//! `tracing` filter directive by the binary that installs the subscriber.

use core::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Log levels, least to most severe
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum LogLevel {
    /// Detailed tracing, including calling-convention internals
    Trace,
    /// Lifecycle details
    Debug,
    /// Lifecycle milestones
    #[default]
    Info,
    /// Potential issues
    Warn,
    /// Failures
    Error,
}

/// Error for unrecognised log level names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLogLevelError {
    /// The rejected input
    pub input: String,
}

impl fmt::Display for ParseLogLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid log level: {}", self.input)
    }
}

impl std::error::Error for ParseLogLevelError {}

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "err" => Ok(Self::Error),
            _ => Err(ParseLogLevelError {
                input: s.to_owned(),
            }),
        }
    }
}

impl LogLevel {
    /// Parses `s`, falling back to [`LogLevel::Info`].
    #[must_use]
    pub fn from_string_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }

    /// Lowercase name, also a valid `tracing` filter directive
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for LogLevel {
    type Error = ParseLogLevelError;

    fn try_from(value: String) -> Result<Self, ParseLogLevelError> {
        value.parse()
    }
}

impl From<LogLevel> for String {
    fn from(level: LogLevel) -> Self {
        level.as_str().to_owned()
    }
}
