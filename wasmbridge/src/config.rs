// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Configuration management for wasmbridge
//!
//! A configuration file is TOML:
//!
//! ```toml
//! [payload]
//! strategy = "detect"          # embedded | file | url | detect
//! marker = "WASMBRIDGE_BROWSER"
//! data_uri_file = "pkg/module.wasm.txt"
//! path = "pkg/module.wasm"
//!
//! [binding]
//! run_start = true
//! start_symbol = "__wbindgen_start"
//!
//! [init]
//! failure_policy = "retry"     # retry | cache
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Relative paths in a loaded file are resolved against the file's directory.

use std::{
    borrow::Cow,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;
use wasmbridge_error::{codes, kinds, Result};
use wasmbridge_host::{abi, StartRoutine};
use wasmbridge_sync::FailurePolicy;

use crate::{
    environment,
    level::LogLevel,
    payload::{EmbeddedPayload, PayloadSource},
};

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "WASMBRIDGE_CONFIG";

/// Module file used when nothing is configured
pub const DEFAULT_MODULE_PATH: &str = "module.wasm";

/// Complete wasmbridge configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Where the module bytes come from
    pub payload: PayloadConfig,
    /// Post-bind behaviour
    pub binding: BindingConfig,
    /// Initialization behaviour
    pub init:    InitConfig,
    /// Logging
    pub logging: LoggingConfig,
}

/// Payload strategy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "kebab-case")]
pub enum PayloadConfig {
    /// A data URI, inline or in a text file
    Embedded {
        /// Inline data URI
        #[serde(default)]
        data_uri:      Option<String>,
        /// File holding the data URI
        #[serde(default)]
        data_uri_file: Option<PathBuf>,
    },
    /// A module file
    File {
        /// Module path
        path: PathBuf,
    },
    /// A module URL, requires the `fetch` feature
    Url {
        /// Module URL
        url: String,
    },
    /// Embedded or file, decided by an environment marker
    Detect {
        /// Marker variable
        #[serde(default = "default_marker")]
        marker:        String,
        /// Inline data URI
        #[serde(default)]
        data_uri:      Option<String>,
        /// File holding the data URI
        #[serde(default)]
        data_uri_file: Option<PathBuf>,
        /// Module path
        path:          PathBuf,
    },
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self::File {
            path: PathBuf::from(DEFAULT_MODULE_PATH),
        }
    }
}

fn default_marker() -> String {
    environment::DEFAULT_MARKER.to_owned()
}

/// Post-bind start routine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Run the start routine after binding
    pub run_start:    bool,
    /// Export name of the start routine
    pub start_symbol: String,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            run_start:    true,
            start_symbol: abi::DEFAULT_START_SYMBOL.to_owned(),
        }
    }
}

impl BindingConfig {
    /// The start routine to run, if any.
    ///
    /// The default symbol is optional, a module without it binds fine. A
    /// custom symbol must be exported.
    #[must_use]
    pub fn start_routine(&self) -> Option<StartRoutine> {
        if !self.run_start {
            None
        } else if self.start_symbol == abi::DEFAULT_START_SYMBOL {
            Some(StartRoutine::default())
        } else {
            Some(StartRoutine::named(self.start_symbol.clone()))
        }
    }
}

/// Initialization settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    /// What to remember after a failed initialization
    pub failure_policy: FailurePolicy,
}

/// Logging settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level
    pub level: LogLevel,
}

impl BridgeConfig {
    /// Parses TOML text.
    ///
    /// # Errors
    ///
    /// `CONFIG_PARSE_ERROR` for invalid TOML or unknown values.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text)
            .map_err(|e| kinds::config_error(codes::CONFIG_PARSE_ERROR, e.to_string()))
    }

    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// `CONFIG_IO_ERROR` if the file cannot be read, `CONFIG_PARSE_ERROR` if
    /// it does not parse.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            kinds::config_error(codes::CONFIG_IO_ERROR, format!("{}: {e}", path.display()))
        })?;
        let mut config = Self::from_toml_str(&text)
            .map_err(|e| e.context(&path.display().to_string()))?;
        if let Some(base) = path.parent() {
            config.payload.resolve_relative(base);
        }
        debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// Loads the file named by [`CONFIG_ENV`], or returns the defaults.
    ///
    /// # Errors
    ///
    /// As [`BridgeConfig::load`].
    pub fn from_env() -> Result<Self> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => {
                debug!("{CONFIG_ENV} not set, using default configuration");
                Ok(Self::default())
            },
        }
    }
}

impl PayloadConfig {
    /// Turns the configuration into a payload source.
    ///
    /// Nothing is read here: a `data_uri_file` is opened when the payload is
    /// fetched, and only if that form is the one selected.
    ///
    /// # Errors
    ///
    /// `CONFIG_INVALID` when both or neither of `data_uri` and
    /// `data_uri_file` are set, `FEATURE_DISABLED` for a URL without the
    /// `fetch` feature.
    pub fn into_source(self) -> Result<PayloadSource> {
        match self {
            Self::Embedded {
                data_uri,
                data_uri_file,
            } => Ok(match embedded_payload(data_uri, data_uri_file)? {
                EmbeddedPayload::Uri(uri) => PayloadSource::Embedded(uri),
                EmbeddedPayload::File(path) => PayloadSource::EmbeddedFile(path),
            }),
            Self::File { path } => Ok(PayloadSource::FileSystemPath(path)),
            Self::Url { url } => url_source(url),
            Self::Detect {
                marker,
                data_uri,
                data_uri_file,
                path,
            } => Ok(PayloadSource::Detect {
                marker: Cow::Owned(marker),
                embedded: embedded_payload(data_uri, data_uri_file)?,
                path,
            }),
        }
    }

    fn resolve_relative(&mut self, base: &Path) {
        let rebase = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };
        match self {
            Self::Embedded { data_uri_file, .. } => data_uri_file.iter_mut().for_each(rebase),
            Self::File { path } => rebase(path),
            Self::Url { .. } => {},
            Self::Detect {
                data_uri_file,
                path,
                ..
            } => {
                data_uri_file.iter_mut().for_each(rebase);
                rebase(path);
            },
        }
    }
}

fn embedded_payload(
    data_uri: Option<String>,
    data_uri_file: Option<PathBuf>,
) -> Result<EmbeddedPayload> {
    match (data_uri, data_uri_file) {
        (Some(uri), None) => Ok(EmbeddedPayload::Uri(Cow::Owned(uri))),
        (None, Some(path)) => Ok(EmbeddedPayload::File(path)),
        (Some(_), Some(_)) => Err(kinds::config_error(
            codes::CONFIG_INVALID,
            "set only one of `data_uri` and `data_uri_file`",
        )),
        (None, None) => Err(kinds::config_error(
            codes::CONFIG_INVALID,
            "embedded payload needs `data_uri` or `data_uri_file`",
        )),
    }
}

#[cfg(feature = "fetch")]
#[allow(clippy::unnecessary_wraps)]
fn url_source(url: String) -> Result<PayloadSource> {
    Ok(PayloadSource::Url(url))
}

#[cfg(not(feature = "fetch"))]
fn url_source(url: String) -> Result<PayloadSource> {
    Err(kinds::config_error(
        codes::FEATURE_DISABLED,
        format!("cannot load {url}: built without the `fetch` feature"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::default();
        assert_eq!(
            config.payload,
            PayloadConfig::File {
                path: PathBuf::from(DEFAULT_MODULE_PATH)
            }
        );
        assert!(config.binding.run_start);
        assert_eq!(config.init.failure_policy, FailurePolicy::Retry);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_start_routine_selection() {
        let mut binding = BindingConfig::default();
        assert_eq!(binding.start_routine(), Some(StartRoutine::default()));

        binding.start_symbol = "init".to_owned();
        assert_eq!(binding.start_routine(), Some(StartRoutine::named("init")));

        binding.run_start = false;
        assert_eq!(binding.start_routine(), None);
    }

    #[test]
    fn test_embedded_needs_exactly_one_form() {
        let neither = PayloadConfig::Embedded {
            data_uri:      None,
            data_uri_file: None,
        };
        assert_eq!(neither.into_source().err().map(|e| e.code), Some(codes::CONFIG_INVALID));

        let both = PayloadConfig::Embedded {
            data_uri:      Some("data:application/wasm;base64,AA==".to_owned()),
            data_uri_file: Some(PathBuf::from("module.txt")),
        };
        assert_eq!(both.into_source().err().map(|e| e.code), Some(codes::CONFIG_INVALID));
    }

    #[test]
    fn test_data_uri_file_is_not_read_up_front() {
        let embedded = PayloadConfig::Embedded {
            data_uri:      None,
            data_uri_file: Some(PathBuf::from("/nonexistent/module.wasm.txt")),
        };
        assert!(matches!(embedded.into_source(), Ok(PayloadSource::EmbeddedFile(_))));

        let detect = PayloadConfig::Detect {
            marker:        default_marker(),
            data_uri:      None,
            data_uri_file: Some(PathBuf::from("/nonexistent/module.wasm.txt")),
            path:          PathBuf::from("module.wasm"),
        };
        assert!(matches!(
            detect.into_source(),
            Ok(PayloadSource::Detect {
                embedded: EmbeddedPayload::File(_),
                ..
            })
        ));
    }

    #[test]
    fn test_relative_paths_follow_config_file() {
        let mut payload = PayloadConfig::File {
            path: PathBuf::from("pkg/module.wasm"),
        };
        payload.resolve_relative(Path::new("/etc/wasmbridge"));
        assert_eq!(
            payload,
            PayloadConfig::File {
                path: PathBuf::from("/etc/wasmbridge/pkg/module.wasm")
            }
        );
    }
}
