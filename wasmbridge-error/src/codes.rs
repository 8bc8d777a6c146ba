// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Error codes for wasmbridge

// Payload errors (1000-1999)
/// Embedded payload is not a `data:` URI
pub const MALFORMED_DATA_URI: u16 = 1001;
/// Embedded payload declares a media type or encoding other than
/// `application/wasm;base64`
pub const UNSUPPORTED_MEDIA_TYPE: u16 = 1002;
/// Embedded payload body is not valid standard base64
pub const INVALID_BASE64: u16 = 1003;
/// Payload file could not be read
pub const PAYLOAD_READ_FAILED: u16 = 1004;
/// Payload could not be fetched over the network
pub const PAYLOAD_FETCH_FAILED: u16 = 1005;
/// Payload decoded to zero bytes
pub const EMPTY_PAYLOAD: u16 = 1006;

// Instantiation and binding errors (2000-2999)
/// The engine rejected the module
pub const INSTANTIATION_FAILED: u16 = 2000;
/// The module failed to compile
pub const COMPILATION_FAILED: u16 = 2001;
/// A required export is missing from the module
pub const MISSING_EXPORT: u16 = 2002;
/// An export does not match the glue calling convention
pub const EXPORT_SIGNATURE_MISMATCH: u16 = 2003;
/// The post-bind start routine trapped or is missing
pub const START_ROUTINE_FAILED: u16 = 2004;
/// Host imports could not be linked
pub const LINK_FAILED: u16 = 2005;

// Initialization errors (3000-3999)
/// An exported function was called before initialization completed
pub const USE_BEFORE_INIT: u16 = 3000;
/// The in-flight initialization task ended without an outcome
pub const INITIALIZATION_ABANDONED: u16 = 3001;
/// No async runtime is available to drive initialization
pub const NO_ASYNC_RUNTIME: u16 = 3002;
/// A process-wide bridge is already installed
pub const ALREADY_INSTALLED: u16 = 3003;

// Invocation errors (4000-4999)
/// The guest trapped during an exported call
pub const GUEST_TRAP: u16 = 4000;
/// The guest reported an error through the return area
pub const GUEST_ERROR: u16 = 4001;
/// The guest returned a buffer of unexpected length
pub const UNEXPECTED_OUTPUT_LENGTH: u16 = 4002;
/// Guest linear memory access out of bounds
pub const MEMORY_ACCESS_ERROR: u16 = 4003;
/// The requested export is not part of the bound glue table
pub const UNKNOWN_EXPORT: u16 = 4004;
/// Wrong number of arguments for an export
pub const ARITY_MISMATCH: u16 = 4005;
/// Buffer too large for 32-bit guest memory
pub const BUFFER_TOO_LARGE: u16 = 4006;

// Configuration errors (5000-5999)
/// Configuration file could not be parsed
pub const CONFIG_PARSE_ERROR: u16 = 5000;
/// Configuration file could not be read
pub const CONFIG_IO_ERROR: u16 = 5001;
/// Configuration is structurally valid but unusable
pub const CONFIG_INVALID: u16 = 5002;
/// The requested strategy needs a cargo feature that is not enabled
pub const FEATURE_DISABLED: u16 = 5003;
/// Engine construction failed
pub const ENGINE_CONFIG_ERROR: u16 = 5004;
