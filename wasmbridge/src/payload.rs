// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Producing the module bytes.
//!
//! A [`PayloadSource`] names where the bytes come from. The embedded form is
//! a `data:` URI holding the module as standard, padded base64:
//!
//! ```text
//! data:application/wasm;base64,AGFzbQEAAAA...
//! ```
//!
//! Anything else in that position (another media type, another encoding
//! token, a URL-safe alphabet, missing padding) is rejected.

use std::{
    borrow::Cow,
    fmt,
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info};
use wasmbridge_error::{codes, kinds, Error, Result};

use crate::environment::{self, Environment, EnvironmentProbe};

/// Scheme prefix of every data URI.
pub const DATA_SCHEME: &str = "data:";
/// The only media type accepted for the module.
pub const WASM_MEDIA_TYPE: &str = "application/wasm";
/// The only encoding token accepted for the module.
pub const BASE64_TOKEN: &str = "base64";

/// A decoded `data:application/wasm;base64,` URI.
#[derive(Clone, PartialEq, Eq)]
pub struct DataUri {
    bytes: Vec<u8>,
}

impl DataUri {
    /// Parses and decodes `uri`.
    ///
    /// # Errors
    ///
    /// `MALFORMED_DATA_URI` if the scheme, separator or encoding token is
    /// wrong, `UNSUPPORTED_MEDIA_TYPE` for a media type other than
    /// `application/wasm`, `EMPTY_PAYLOAD` if nothing follows the comma and
    /// `INVALID_BASE64` if the payload is not standard padded base64.
    pub fn parse(uri: &str) -> Result<Self> {
        let rest = uri.strip_prefix(DATA_SCHEME).ok_or_else(|| {
            kinds::payload_unavailable(
                codes::MALFORMED_DATA_URI,
                "embedded payload does not start with `data:`",
            )
        })?;
        let (header, payload) = rest.split_once(',').ok_or_else(|| {
            kinds::payload_unavailable(
                codes::MALFORMED_DATA_URI,
                "embedded payload has no `,` separator",
            )
        })?;

        let (media_type, encoding) = header.split_once(';').unwrap_or((header, ""));
        if media_type != WASM_MEDIA_TYPE {
            return Err(kinds::payload_unavailable(
                codes::UNSUPPORTED_MEDIA_TYPE,
                format!("media type `{media_type}` is not `{WASM_MEDIA_TYPE}`"),
            ));
        }
        if encoding != BASE64_TOKEN {
            return Err(kinds::payload_unavailable(
                codes::MALFORMED_DATA_URI,
                format!("encoding `{encoding}` is not `{BASE64_TOKEN}`"),
            ));
        }
        if payload.is_empty() {
            return Err(Error::EMPTY_PAYLOAD);
        }

        let bytes = STANDARD.decode(payload).map_err(|e| {
            kinds::payload_unavailable(codes::INVALID_BASE64, format!("embedded payload: {e}"))
        })?;
        Ok(Self { bytes })
    }

    /// Encodes `bytes` into the embedded form.
    #[must_use]
    pub fn encode(bytes: &[u8]) -> String {
        format!("{DATA_SCHEME}{WASM_MEDIA_TYPE};{BASE64_TOKEN},{}", STANDARD.encode(bytes))
    }

    /// Decoded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the URI, returning the decoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUri").field("len", &self.bytes.len()).finish()
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::encode(&self.bytes))
    }
}

/// The embedded form of a [`PayloadSource::Detect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddedPayload {
    /// The data URI itself
    Uri(Cow<'static, str>),
    /// A text file holding the data URI, read when the payload is needed
    File(PathBuf),
}

impl From<&'static str> for EmbeddedPayload {
    fn from(uri: &'static str) -> Self {
        Self::Uri(Cow::Borrowed(uri))
    }
}

impl From<String> for EmbeddedPayload {
    fn from(uri: String) -> Self {
        Self::Uri(Cow::Owned(uri))
    }
}

impl From<Cow<'static, str>> for EmbeddedPayload {
    fn from(uri: Cow<'static, str>) -> Self {
        Self::Uri(uri)
    }
}

/// Where the module bytes come from.
#[derive(Clone)]
pub enum PayloadSource {
    /// A data URI compiled into, or configured for, the consumer
    Embedded(Cow<'static, str>),
    /// A text file holding a data URI
    EmbeddedFile(PathBuf),
    /// A module file read at load time
    FileSystemPath(PathBuf),
    /// Raw bytes linked into the binary, typically with `include_bytes!`
    NativeImport(&'static [u8]),
    /// A module fetched over HTTP(S)
    #[cfg(feature = "fetch")]
    Url(String),
    /// Embedded when `marker` is present, the file otherwise
    Detect {
        /// Environment marker
        marker:   Cow<'static, str>,
        /// Data URI used in a browser-like environment
        embedded: EmbeddedPayload,
        /// Module file used in a file-system environment
        path:     PathBuf,
    },
}

impl PayloadSource {
    /// Detects with [`environment::DEFAULT_MARKER`].
    #[must_use]
    pub fn detect(embedded: impl Into<EmbeddedPayload>, path: impl Into<PathBuf>) -> Self {
        Self::Detect {
            marker:   Cow::Borrowed(environment::DEFAULT_MARKER),
            embedded: embedded.into(),
            path:     path.into(),
        }
    }

    /// Resolves [`PayloadSource::Detect`] through `probe`. Other sources are
    /// returned as they are.
    #[must_use]
    pub fn select(&self, probe: &dyn EnvironmentProbe) -> Self {
        match self.delivery(probe) {
            Delivery::Embedded(uri) => Self::Embedded(uri),
            Delivery::EmbeddedFile(path) => Self::EmbeddedFile(path),
            Delivery::File(path) => Self::FileSystemPath(path),
            Delivery::Native(bytes) => Self::NativeImport(bytes),
            #[cfg(feature = "fetch")]
            Delivery::Url(url) => Self::Url(url),
        }
    }

    /// Produces the module bytes.
    ///
    /// [`PayloadSource::Detect`] is resolved against the process environment;
    /// use [`PayloadSource::select`] first to pick another probe. Files are
    /// only touched here, never when the source is built.
    ///
    /// # Errors
    ///
    /// `Payload` errors: an unreadable file, a failed fetch, a malformed data
    /// URI or an empty payload.
    pub async fn get(&self) -> Result<Cow<'static, [u8]>> {
        let bytes = match self.delivery(&environment::ProcessEnvironment) {
            Delivery::Embedded(uri) => Cow::Owned(DataUri::parse(&uri)?.into_bytes()),
            Delivery::EmbeddedFile(path) => {
                let uri = read_data_uri_file(&path).await?;
                Cow::Owned(DataUri::parse(&uri)?.into_bytes())
            },
            Delivery::File(path) => Cow::Owned(read_file(&path).await?),
            Delivery::Native(bytes) => Cow::Borrowed(bytes),
            #[cfg(feature = "fetch")]
            Delivery::Url(url) => Cow::Owned(fetch(&url).await?),
        };
        if bytes.is_empty() {
            return Err(Error::EMPTY_PAYLOAD);
        }
        info!(source = %self.describe(), len = bytes.len(), "payload ready");
        Ok(bytes)
    }

    fn delivery(&self, probe: &dyn EnvironmentProbe) -> Delivery {
        match self {
            Self::Embedded(uri) => Delivery::Embedded(uri.clone()),
            Self::EmbeddedFile(path) => Delivery::EmbeddedFile(path.clone()),
            Self::FileSystemPath(path) => Delivery::File(path.clone()),
            Self::NativeImport(bytes) => Delivery::Native(*bytes),
            #[cfg(feature = "fetch")]
            Self::Url(url) => Delivery::Url(url.clone()),
            Self::Detect {
                marker,
                embedded,
                path,
            } => match (environment::detect(probe, marker), embedded) {
                (Environment::BrowserLike, EmbeddedPayload::Uri(uri)) => {
                    Delivery::Embedded(uri.clone())
                },
                (Environment::BrowserLike, EmbeddedPayload::File(file)) => {
                    Delivery::EmbeddedFile(file.clone())
                },
                (Environment::FileSystem, _) => Delivery::File(path.clone()),
            },
        }
    }

    /// Short description for logs, without the payload itself.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Embedded(uri) => format!("embedded data URI ({} chars)", uri.len()),
            Self::EmbeddedFile(path) => format!("data URI file {}", path.display()),
            Self::FileSystemPath(path) => format!("file {}", path.display()),
            Self::NativeImport(bytes) => format!("native import ({} bytes)", bytes.len()),
            #[cfg(feature = "fetch")]
            Self::Url(url) => format!("url {url}"),
            Self::Detect { marker, path, .. } => {
                format!("detect via `{marker}` (file {})", path.display())
            },
        }
    }
}

// A source with the environment decision already taken.
enum Delivery {
    Embedded(Cow<'static, str>),
    EmbeddedFile(PathBuf),
    File(PathBuf),
    Native(&'static [u8]),
    #[cfg(feature = "fetch")]
    Url(String),
}

impl fmt::Debug for PayloadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PayloadSource").field(&self.describe()).finish()
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    debug!(path = %path.display(), "reading module file");
    tokio::fs::read(path).await.map_err(|e| {
        kinds::payload_unavailable(codes::PAYLOAD_READ_FAILED, format!("{}: {e}", path.display()))
    })
}

async fn read_data_uri_file(path: &Path) -> Result<String> {
    debug!(path = %path.display(), "reading data URI file");
    let text = tokio::fs::read_to_string(path).await.map_err(|e| {
        kinds::payload_unavailable(codes::PAYLOAD_READ_FAILED, format!("{}: {e}", path.display()))
    })?;
    Ok(text.trim().to_owned())
}

#[cfg(feature = "fetch")]
async fn fetch(url: &str) -> Result<Vec<u8>> {
    debug!(url, "fetching module");
    let failed = |e: reqwest::Error| {
        kinds::payload_unavailable(codes::PAYLOAD_FETCH_FAILED, format!("{url}: {e}"))
    };
    let response = reqwest::get(url).await.map_err(failed)?;
    let response = response.error_for_status().map_err(failed)?;
    let bytes = response.bytes().await.map_err(failed)?;
    Ok(bytes.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAGIC: &[u8] = b"\0asm\x01\0\0\0";

    #[test]
    fn test_encode_matches_embedding_contract() {
        assert_eq!(DataUri::encode(MAGIC), "data:application/wasm;base64,AGFzbQEAAAA=");
    }

    #[test]
    fn test_parse_decodes_payload() {
        let uri = DataUri::parse("data:application/wasm;base64,AGFzbQEAAAA=");
        assert_eq!(uri.map(DataUri::into_bytes), Ok(MAGIC.to_vec()));
    }

    #[test]
    fn test_parse_rejects_deviations() {
        let cases = [
            ("application/wasm;base64,AGFzbQEAAAA=", codes::MALFORMED_DATA_URI),
            ("data:application/wasm;base64", codes::MALFORMED_DATA_URI),
            ("data:application/octet-stream;base64,AGFzbQEAAAA=", codes::UNSUPPORTED_MEDIA_TYPE),
            ("data:application/wasm,AGFzbQEAAAA=", codes::MALFORMED_DATA_URI),
            ("data:application/wasm;base32,AGFzbQEAAAA=", codes::MALFORMED_DATA_URI),
            ("data:application/wasm;base64,", codes::EMPTY_PAYLOAD),
            ("data:application/wasm;base64,AGFzbQEAAAA", codes::INVALID_BASE64),
            ("data:application/wasm;base64,AGF-bQEAAAA=", codes::INVALID_BASE64),
            ("data:application/wasm;base64,AGFz bQEAAAA=", codes::INVALID_BASE64),
        ];
        for (uri, code) in cases {
            let error = DataUri::parse(uri).err();
            assert_eq!(error.as_ref().map(|e| e.code), Some(code), "{uri}");
            assert!(error.is_some_and(|e| e.is_payload_unavailable()));
        }
    }

    #[test]
    fn test_debug_hides_payload() {
        let source = PayloadSource::Embedded(Cow::Borrowed("data:application/wasm;base64,AGFzbQEAAAA="));
        let rendered = format!("{source:?}");
        assert!(!rendered.contains("AGFzbQEAAAA"));
        assert!(rendered.contains("41 chars"));
    }

    struct Browser;

    impl EnvironmentProbe for Browser {
        fn has_marker(&self, _marker: &str) -> bool {
            true
        }
    }

    #[test]
    fn test_detect_selects_embedded_file_without_reading_it() {
        let source = PayloadSource::detect(
            EmbeddedPayload::File(PathBuf::from("/nonexistent/module.wasm.txt")),
            "/nonexistent/module.wasm",
        );
        assert!(matches!(
            source.select(&Browser),
            PayloadSource::EmbeddedFile(path) if path == Path::new("/nonexistent/module.wasm.txt")
        ));
    }
}
