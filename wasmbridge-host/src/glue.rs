// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! Binding a module instance to a table of expected byte functions.
//!
//! A [`GlueTable`] lists the exports the host wants to call. Binding it to a
//! [`ModuleInstance`] checks every declared export against the calling
//! convention, runs the optional start routine and yields a [`BoundGlue`]
//! that can be shared across threads. The table is consumed, so one table
//! binds exactly one instance.

use std::borrow::Cow;

use parking_lot::Mutex;
use tracing::{debug, info};
use wasmbridge_error::{codes, kinds, Result};
use wasmtime::ValType;

use crate::{
    abi,
    function::ExportSignature,
    instance::{ModuleInstance, RawOutput},
};

/// Routine run once after binding, before any export is callable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartRoutine {
    symbol:   Cow<'static, str>,
    required: bool,
}

impl StartRoutine {
    /// Runs `symbol`, failing the binding if the module does not export it.
    #[must_use]
    pub fn named(symbol: impl Into<Cow<'static, str>>) -> Self {
        Self {
            symbol:   symbol.into(),
            required: true,
        }
    }

    /// Export name of the routine.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

impl Default for StartRoutine {
    /// [`abi::DEFAULT_START_SYMBOL`], skipped when the module has none.
    fn default() -> Self {
        Self {
            symbol:   Cow::Borrowed(abi::DEFAULT_START_SYMBOL),
            required: false,
        }
    }
}

/// Exports a host expects from a module, plus the post-bind routine.
#[derive(Debug, Clone)]
pub struct GlueTable {
    signatures: Vec<ExportSignature>,
    start:      Option<StartRoutine>,
}

impl GlueTable {
    /// Table with the given exports and no start routine.
    #[must_use]
    pub fn new(signatures: &[ExportSignature]) -> Self {
        Self {
            signatures: signatures.to_vec(),
            start:      None,
        }
    }

    /// Runs `start` after validation.
    #[must_use]
    pub fn with_start(mut self, start: Option<StartRoutine>) -> Self {
        self.start = start;
        self
    }

    /// Declared exports.
    #[must_use]
    pub fn signatures(&self) -> &[ExportSignature] {
        &self.signatures
    }

    /// Binds `instance` to this table.
    ///
    /// # Errors
    ///
    /// `MISSING_EXPORT` or `EXPORT_SIGNATURE_MISMATCH` when a declared export
    /// is absent or does not follow the calling convention,
    /// `START_ROUTINE_FAILED` when the start routine fails.
    pub fn bind(self, mut instance: ModuleInstance) -> Result<BoundGlue> {
        for signature in &self.signatures {
            check_signature(&instance, signature)?;
        }
        debug!(exports = self.signatures.len(), "glue table validated");

        if let Some(start) = &self.start {
            if start.required || instance.has_export(start.symbol()) {
                instance.call_start(start.symbol())?;
                info!(symbol = start.symbol(), "start routine completed");
            } else {
                debug!(symbol = start.symbol(), "module has no start routine");
            }
        }

        Ok(BoundGlue {
            instance:   Mutex::new(instance),
            signatures: self.signatures,
        })
    }
}

fn check_signature(instance: &ModuleInstance, signature: &ExportSignature) -> Result<()> {
    let Some(ty) = instance.func_type(signature.name) else {
        return Err(kinds::binding_error(
            codes::MISSING_EXPORT,
            format!("module does not export function `{}`", signature.name),
        ));
    };
    let params_ok = ty.params().len() == signature.param_count()
        && ty.params().all(|p| matches!(p, ValType::I32));
    if !params_ok || ty.results().next().is_some() {
        return Err(kinds::binding_error(
            codes::EXPORT_SIGNATURE_MISMATCH,
            format!(
                "`{}` has type {ty:?}, expected {} i32 parameters and no results",
                signature.name,
                signature.param_count()
            ),
        ));
    }
    Ok(())
}

/// A module bound to its glue table. Calls are serialised on the instance.
pub struct BoundGlue {
    instance:   Mutex<ModuleInstance>,
    signatures: Vec<ExportSignature>,
}

impl BoundGlue {
    /// Calls the declared byte function `name`.
    ///
    /// # Errors
    ///
    /// `UNKNOWN_EXPORT` if `name` is not in the table, `ARITY_MISMATCH` on a
    /// wrong argument count, `GUEST_ERROR` when a fallible export reports an error
    /// and `GUEST_TRAP` when it traps.
    pub fn call(&self, name: &str, args: &[&[u8]]) -> Result<Vec<u8>> {
        let signature = self.signature(name)?;
        if args.len() != signature.arity {
            return Err(kinds::invocation_error(
                codes::ARITY_MISMATCH,
                format!("`{name}` takes {} arguments, got {}", signature.arity, args.len()),
            ));
        }

        let RawOutput { bytes, is_err } = self
            .instance
            .lock()
            .call_bytes(name, signature.returns, args)?;
        if is_err {
            let message = String::from_utf8_lossy(&bytes);
            return Err(kinds::invocation_error(
                codes::GUEST_ERROR,
                format!("`{name}` failed: {message}"),
            ));
        }
        Ok(bytes)
    }

    /// Calls `name` and requires exactly `N` output bytes.
    ///
    /// # Errors
    ///
    /// As [`BoundGlue::call`], plus `UNEXPECTED_OUTPUT_LENGTH`.
    pub fn call_fixed<const N: usize>(&self, name: &str, args: &[&[u8]]) -> Result<[u8; N]> {
        let bytes = self.call(name, args)?;
        <[u8; N]>::try_from(bytes.as_slice()).map_err(|_| {
            kinds::invocation_error(
                codes::UNEXPECTED_OUTPUT_LENGTH,
                format!("`{name}` returned {} bytes, expected {N}", bytes.len()),
            )
        })
    }

    /// Names of the functions this glue exposes.
    #[must_use]
    pub fn export_names(&self) -> Vec<&'static str> {
        self.signatures.iter().map(|s| s.name).collect()
    }

    /// Every export of the underlying module, runtime exports included.
    #[must_use]
    pub fn module_exports(&self) -> Vec<String> {
        self.instance.lock().export_names()
    }

    /// Declared exports.
    #[must_use]
    pub fn signatures(&self) -> &[ExportSignature] {
        &self.signatures
    }

    fn signature(&self, name: &str) -> Result<ExportSignature> {
        self.signatures
            .iter()
            .find(|s| s.name == name)
            .copied()
            .ok_or_else(|| {
                kinds::invocation_error(
                    codes::UNKNOWN_EXPORT,
                    format!("`{name}` is not part of the glue table"),
                )
            })
    }
}

impl core::fmt::Debug for BoundGlue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BoundGlue")
            .field("exports", &self.export_names())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_start_is_optional() {
        let start = StartRoutine::default();
        assert_eq!(start.symbol(), abi::DEFAULT_START_SYMBOL);
        assert!(!start.required);
        assert!(StartRoutine::named("init").required);
    }

    #[test]
    fn test_table_keeps_declaration_order() {
        let table = GlueTable::new(&[
            ExportSignature::bytes("a", 1),
            ExportSignature::fallible("b", 2),
        ]);
        let names: Vec<_> = table.signatures().iter().map(|s| s.name).collect();
        assert_eq!(names, ["a", "b"]);
    }
}
