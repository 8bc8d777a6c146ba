// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! A compiled, instantiated module together with its runtime exports.

use tracing::{debug, trace};
use wasmbridge_error::{codes, kinds, Result};
use wasmtime::{
    Caller, Engine, Extern, ExternType, FuncType, Instance, Linker, Memory, Module, Store,
    TypedFunc, Val,
};

use crate::{
    abi::{self, ReturnArea},
    function::Returns,
};

/// Raw output of a byte function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawOutput {
    /// Bytes copied out of guest memory
    pub bytes:  Vec<u8>,
    /// The guest set the error flag
    pub is_err: bool,
}

/// Module instance with the resolved runtime exports of the calling
/// convention.
pub struct ModuleInstance {
    module:   Module,
    store:    Store<()>,
    instance: Instance,
    memory:   Memory,
    malloc:   TypedFunc<(i32, i32), i32>,
    free:     TypedFunc<(i32, i32, i32), ()>,
    stack:    TypedFunc<i32, i32>,
}

impl ModuleInstance {
    /// Compiles `bytes`, links the host imports and instantiates the module.
    ///
    /// Every import named [`abi::THROW_IMPORT`] is served by the host and
    /// traps with the message the guest passes in. Other imports trap when
    /// called.
    ///
    /// # Errors
    ///
    /// `Instantiation` errors when the bytes do not compile or instantiation
    /// fails, `Binding` errors when a runtime export is missing.
    pub fn instantiate(engine: &Engine, bytes: &[u8]) -> Result<Self> {
        let module = Module::new(engine, bytes).map_err(|e| {
            kinds::instantiation_failed(codes::COMPILATION_FAILED, format!("{e:#}"))
        })?;
        debug!(
            imports = module.imports().len(),
            exports = module.exports().len(),
            "module compiled"
        );

        let mut linker = Linker::new(engine);
        let mut linked: Vec<String> = Vec::new();
        for import in module.imports() {
            if import.name() != abi::THROW_IMPORT
                || !matches!(import.ty(), ExternType::Func(_))
                || linked.iter().any(|m| m == import.module())
            {
                continue;
            }
            linker
                .func_wrap(import.module(), abi::THROW_IMPORT, guest_throw)
                .map_err(|e| kinds::instantiation_failed(codes::LINK_FAILED, format!("{e:#}")))?;
            linked.push(import.module().to_owned());
        }
        linker
            .define_unknown_imports_as_traps(&module)
            .map_err(|e| kinds::instantiation_failed(codes::LINK_FAILED, format!("{e:#}")))?;

        let mut store = Store::new(engine, ());
        let instance = linker.instantiate(&mut store, &module).map_err(|e| {
            kinds::instantiation_failed(codes::INSTANTIATION_FAILED, format!("{e:#}"))
        })?;

        let memory = instance
            .get_memory(&mut store, abi::MEMORY)
            .ok_or_else(|| missing_export(abi::MEMORY))?;
        let malloc = runtime_func(&instance, &mut store, abi::MALLOC)?;
        let free = runtime_func(&instance, &mut store, abi::FREE)?;
        let stack = runtime_func(&instance, &mut store, abi::ADD_TO_STACK_POINTER)?;

        Ok(Self {
            module,
            store,
            instance,
            memory,
            malloc,
            free,
            stack,
        })
    }

    /// Names of all exports of the module, in declaration order.
    #[must_use]
    pub fn export_names(&self) -> Vec<String> {
        self.module.exports().map(|e| e.name().to_owned()).collect()
    }

    /// Function type of export `name`, if it is a function.
    #[must_use]
    pub fn func_type(&self, name: &str) -> Option<FuncType> {
        match self.module.get_export(name)? {
            ExternType::Func(ty) => Some(ty),
            _ => None,
        }
    }

    /// Whether the module exports `name` at all.
    #[must_use]
    pub fn has_export(&self, name: &str) -> bool {
        self.module.get_export(name).is_some()
    }

    /// Runs the nullary routine `symbol`.
    ///
    /// # Errors
    ///
    /// `START_ROUTINE_FAILED` when the routine is missing, has the wrong type
    /// or traps.
    pub fn call_start(&mut self, symbol: &str) -> Result<()> {
        let start: TypedFunc<(), ()> = self
            .instance
            .get_typed_func(&mut self.store, symbol)
            .map_err(|e| {
                kinds::binding_error(
                    codes::START_ROUTINE_FAILED,
                    format!("start routine `{symbol}` unusable: {e:#}"),
                )
            })?;
        start.call(&mut self.store, ()).map_err(|e| {
            kinds::binding_error(
                codes::START_ROUTINE_FAILED,
                format!("start routine `{symbol}` trapped: {e:#}"),
            )
        })
    }

    /// Calls the byte function `name` with `args`, one slice per argument,
    /// decoding the return area as `returns` lays it out.
    ///
    /// The caller is responsible for the export's shape; a mismatch surfaces
    /// as a trap from the engine.
    ///
    /// # Errors
    ///
    /// `Invocation` errors when the export is missing, an argument does not
    /// fit in guest memory, guest memory is out of bounds or the guest traps.
    pub fn call_bytes(&mut self, name: &str, returns: Returns, args: &[&[u8]]) -> Result<RawOutput> {
        let func = self.instance.get_func(&mut self.store, name).ok_or_else(|| {
            kinds::invocation_error(codes::UNKNOWN_EXPORT, format!("no export named `{name}`"))
        })?;

        let retptr = self
            .stack
            .call(&mut self.store, -abi::RETURN_AREA_SIZE_ALIGNED)
            .map_err(|e| trap(name, &e))?;
        let output = self.call_with_retptr(name, func, retptr, returns, args);
        let restored = self.stack.call(&mut self.store, abi::RETURN_AREA_SIZE_ALIGNED);

        let output = output?;
        restored.map_err(|e| trap(name, &e))?;
        Ok(output)
    }

    fn call_with_retptr(
        &mut self,
        name: &str,
        func: wasmtime::Func,
        retptr: i32,
        returns: Returns,
        args: &[&[u8]],
    ) -> Result<RawOutput> {
        let mut params = Vec::with_capacity(abi::param_count(args.len()));
        params.push(Val::I32(retptr));
        for arg in args {
            let (ptr, len) = self.pass_bytes(arg)?;
            params.push(Val::I32(ptr));
            params.push(Val::I32(len));
        }

        func.call(&mut self.store, &params, &mut [])
            .map_err(|e| trap(name, &e))?;

        let mut raw = [0u8; abi::FALLIBLE_RETURN_AREA_SIZE];
        self.read(guest_offset(retptr), &mut raw[..returns.return_area_size()])?;
        let area = ReturnArea::decode(returns, &raw);
        trace!(
            export = name,
            ptr = area.ptr,
            len = area.len,
            err = area.err,
            is_err = area.is_err,
            "return area"
        );

        self.check_output_bounds(name, &area)?;
        let mut bytes = vec![0u8; area.len as usize];
        self.read(area.ptr as usize, &mut bytes)?;
        if area.len > 0 {
            let released = (area.ptr as i32, area.len as i32, abi::BYTE_ALIGN);
            self.free
                .call(&mut self.store, released)
                .map_err(|e| trap(name, &e))?;
        }

        Ok(RawOutput {
            bytes,
            is_err: area.is_err,
        })
    }

    fn pass_bytes(&mut self, bytes: &[u8]) -> Result<(i32, i32)> {
        let len = i32::try_from(bytes.len()).map_err(|_| {
            kinds::invocation_error(
                codes::BUFFER_TOO_LARGE,
                format!("argument of {} bytes does not fit in guest memory", bytes.len()),
            )
        })?;
        let ptr = self
            .malloc
            .call(&mut self.store, (len, abi::BYTE_ALIGN))
            .map_err(|e| trap(abi::MALLOC, &e))?;
        self.memory
            .write(&mut self.store, guest_offset(ptr), bytes)
            .map_err(|e| memory_error(&e))?;
        Ok((ptr, len))
    }

    fn check_output_bounds(&self, name: &str, area: &ReturnArea) -> Result<()> {
        let size = self.memory.data_size(&self.store);
        let end = (area.ptr as usize).checked_add(area.len as usize);
        if end.is_none_or(|end| end > size) {
            return Err(kinds::invocation_error(
                codes::MEMORY_ACCESS_ERROR,
                format!(
                    "`{name}` returned {} bytes at {:#x}, outside guest memory of {size} bytes",
                    area.len, area.ptr
                ),
            ));
        }
        Ok(())
    }

    fn read(&self, offset: usize, buffer: &mut [u8]) -> Result<()> {
        self.memory
            .read(&self.store, offset, buffer)
            .map_err(|e| memory_error(&e))
    }
}

impl core::fmt::Debug for ModuleInstance {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ModuleInstance")
            .field("exports", &self.module.exports().len())
            .finish_non_exhaustive()
    }
}

fn runtime_func<P, R>(instance: &Instance, store: &mut Store<()>, name: &str) -> Result<TypedFunc<P, R>>
where
    P: wasmtime::WasmParams,
    R: wasmtime::WasmResults,
{
    if instance.get_func(&mut *store, name).is_none() {
        return Err(missing_export(name));
    }
    instance.get_typed_func(store, name).map_err(|e| {
        kinds::binding_error(
            codes::EXPORT_SIGNATURE_MISMATCH,
            format!("runtime export `{name}` has the wrong type: {e:#}"),
        )
    })
}

fn missing_export(name: &str) -> wasmbridge_error::Error {
    kinds::binding_error(codes::MISSING_EXPORT, format!("module does not export `{name}`"))
}

fn trap(name: &str, error: &wasmtime::Error) -> wasmbridge_error::Error {
    kinds::invocation_error(codes::GUEST_TRAP, format!("`{name}` trapped: {error:#}"))
}

fn memory_error(error: &wasmtime::MemoryAccessError) -> wasmbridge_error::Error {
    kinds::invocation_error(codes::MEMORY_ACCESS_ERROR, error.to_string())
}

// Guest pointers are unsigned 32-bit offsets carried in i32 values.
fn guest_offset(ptr: i32) -> usize {
    ptr as u32 as usize
}

fn guest_throw(mut caller: Caller<'_, ()>, ptr: i32, len: i32) -> wasmtime::Result<()> {
    let message = caller
        .get_export(abi::MEMORY)
        .and_then(Extern::into_memory)
        .and_then(|memory| {
            let start = guest_offset(ptr);
            let end = start.checked_add(guest_offset(len))?;
            memory
                .data(&caller)
                .get(start..end)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        })
        .unwrap_or_else(|| String::from("guest raised an unreadable error"));
    Err(wasmtime::Error::msg(message))
}
