// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! The initialization context.
//!
//! A [`Bridge`] owns everything needed to bring the module up once: the
//! engine, the payload source, the binding options and the single-flight
//! state. Its lifecycle is:
//!
//! 1. `Uninitialized`: exported functions fail with `UseBeforeInit`.
//! 2. `Initializing`: the first [`Bridge::initialize`] fetches the payload,
//!    instantiates the module, binds the glue table and runs the start
//!    routine. Concurrent calls attach to that attempt.
//! 3. `Initialized`: [`Bridge::exports`] hands out the bound functions for
//!    the rest of the bridge's life.
//!
//! A failed attempt either returns the bridge to `Uninitialized` or sticks,
//! depending on the [`FailurePolicy`].

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tracing::{debug, info};
use wasmbridge_error::{codes, kinds, Error, Result};
use wasmbridge_host::{GlueTable, ModuleInstance, StartRoutine};
use wasmbridge_sync::{FailurePolicy, InitState, SingleFlight};
use wasmtime::{Config, Engine};

use crate::{
    config::BridgeConfig,
    environment::{EnvironmentProbe, ProcessEnvironment},
    exports::{Exports, SIGNATURES},
    payload::PayloadSource,
};

/// Binding and initialization options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    /// Routine run after binding; `None` skips it
    pub start:          Option<StartRoutine>,
    /// What to remember after a failed initialization
    pub failure_policy: FailurePolicy,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            start:          Some(StartRoutine::default()),
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl BridgeOptions {
    /// Options from the `[binding]` and `[init]` sections.
    #[must_use]
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            start:          config.binding.start_routine(),
            failure_policy: config.init.failure_policy,
        }
    }
}

/// Counters of the expensive initialization steps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Payload fetches started
    pub payload_fetches: usize,
    /// Instantiations started
    pub instantiations:  usize,
}

#[derive(Debug, Default)]
struct Counters {
    payload_fetches: AtomicUsize,
    instantiations:  AtomicUsize,
}

/// One module, initialized at most once.
pub struct Bridge {
    engine:   Engine,
    source:   PayloadSource,
    options:  BridgeOptions,
    probe:    Arc<dyn EnvironmentProbe>,
    cell:     SingleFlight<Exports>,
    counters: Arc<Counters>,
}

impl Bridge {
    /// Bridge described by `config`.
    ///
    /// # Errors
    ///
    /// Errors from [`crate::config::PayloadConfig::into_source`].
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let source = config.payload.clone().into_source()?;
        Ok(Self::with_source(source, BridgeOptions::from_config(config)))
    }

    /// Bridge over an explicit payload source.
    #[must_use]
    pub fn with_source(source: PayloadSource, options: BridgeOptions) -> Self {
        debug!(source = %source.describe(), ?options, "bridge created");
        Self {
            engine: Engine::default(),
            cell: SingleFlight::new(options.failure_policy),
            source,
            options,
            probe: Arc::new(ProcessEnvironment),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Replaces the environment probe used to resolve
    /// [`PayloadSource::Detect`].
    #[must_use]
    pub fn with_probe(mut self, probe: impl EnvironmentProbe + 'static) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    /// Replaces the engine, for instance one with a custom `wasmtime::Config`.
    #[must_use]
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Builds a fresh engine from `config` and uses it for this bridge.
    ///
    /// # Errors
    ///
    /// `ENGINE_CONFIG_ERROR` when wasmtime rejects the settings.
    pub fn with_engine_config(self, config: &Config) -> Result<Self> {
        let engine = Engine::new(config)
            .map_err(|e| kinds::config_error(codes::ENGINE_CONFIG_ERROR, format!("{e:#}")))?;
        Ok(self.with_engine(engine))
    }

    /// Brings the module up, or attaches to the attempt already running.
    ///
    /// Idempotent: after success it returns the same exports immediately.
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// `Payload`, `Instantiation` or `Binding` errors from the attempt, shared
    /// by every caller waiting on it.
    pub async fn initialize(&self) -> Result<Arc<Exports>> {
        self.cell
            .get_or_try_init(|| {
                let engine = self.engine.clone();
                let source = self.source.select(self.probe.as_ref());
                let start = self.options.start.clone();
                let counters = Arc::clone(&self.counters);
                load(engine, source, start, counters)
            })
            .await
    }

    /// The bound exports.
    ///
    /// # Errors
    ///
    /// `USE_BEFORE_INIT` until [`Bridge::initialize`] has succeeded.
    pub fn exports(&self) -> Result<Arc<Exports>> {
        self.cell.get().ok_or(Error::USE_BEFORE_INIT)
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> InitState {
        self.cell.state()
    }

    /// How many times the expensive steps have run.
    #[must_use]
    pub fn stats(&self) -> BridgeStats {
        BridgeStats {
            payload_fetches: self.counters.payload_fetches.load(Ordering::Acquire),
            instantiations:  self.counters.instantiations.load(Ordering::Acquire),
        }
    }

    /// Configured payload source.
    #[must_use]
    pub fn source(&self) -> &PayloadSource {
        &self.source
    }

    /// Configured options.
    #[must_use]
    pub fn options(&self) -> &BridgeOptions {
        &self.options
    }
}

impl core::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Bridge")
            .field("source", &self.source)
            .field("options", &self.options)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

async fn load(
    engine: Engine,
    source: PayloadSource,
    start: Option<StartRoutine>,
    counters: Arc<Counters>,
) -> Result<Exports> {
    info!(source = %source.describe(), "initializing module");
    counters.payload_fetches.fetch_add(1, Ordering::AcqRel);
    let bytes = source.get().await?;

    counters.instantiations.fetch_add(1, Ordering::AcqRel);
    let glue = tokio::task::spawn_blocking(move || {
        let instance = ModuleInstance::instantiate(&engine, &bytes)?;
        GlueTable::new(SIGNATURES).with_start(start).bind(instance)
    })
    .await
    .map_err(|_| Error::INITIALIZATION_ABANDONED)??;

    info!(exports = SIGNATURES.len(), "module ready");
    Ok(Exports::new(glue))
}
