// Copyright (c) 2025 The wasmbridge Project Developers
// Licensed under the MIT license.
// SPDX-License-Identifier: MIT

//! # wasmbridge
//!
//! Command line front end for the wasmbridge loader. It loads a crypto module
//! the way an application would and calls its exports.
//!
//! ## Usage
//!
//! ```bash
//! wasmbridge [--config <file>] [--wasm <file> | --data-uri-file <file>] <command>
//! ```
//!
//! Commands:
//! - `check` loads and binds the module and reports timings
//! - `exports` lists the bound exports and everything the module exports
//! - `hash` prints the hex digest of `--text` or `--file`, optionally with `--context`
//! - `nonce` prints the hex nonce derived from some material
//!
//! `RUST_LOG` overrides `--log-level`, and `RUST_LOG_FORMAT` selects `pretty`
//! (default), `compact` or `json` output.

use std::{
    env,
    path::PathBuf,
    process::ExitCode,
    time::Instant,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use wasmbridge::{config::PayloadConfig, Bridge, BridgeConfig, LogLevel};

/// wasmbridge CLI arguments
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, env = "WASMBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Load the module from this file, overriding the configured payload
    #[arg(short, long, conflicts_with = "data_uri_file")]
    wasm: Option<PathBuf>,

    /// Load the module from a file holding a data URI
    #[arg(long)]
    data_uri_file: Option<PathBuf>,

    /// Skip the module's start routine
    #[arg(long)]
    no_start: bool,

    /// Minimum log level, overriding the configuration
    #[arg(short, long)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Load and bind the module
    Check,
    /// List exports
    Exports,
    /// Hash some input
    Hash {
        /// Text to hash
        #[arg(short, long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,
        /// File to hash
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Context string mixed into the digest
        #[arg(long)]
        context: Option<String>,
    },
    /// Derive a nonce
    Nonce {
        /// Nonce material
        material: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("wasmbridge: {e:#}");
            return ExitCode::FAILURE;
        },
    };
    initialize_tracing(config.logging.level);

    match run(&args.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Initialize the tracing system for logging
fn initialize_tracing(level: LogLevel) {
    let format = env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match format.as_str() {
        "json" => subscriber.json().init(),
        "compact" => subscriber.compact().init(),
        _ => subscriber.pretty().init(),
    }
}

/// Configuration file (or defaults) with the command line overrides applied
fn build_config(args: &Args) -> Result<BridgeConfig> {
    let mut config = match &args.config {
        Some(path) => BridgeConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => BridgeConfig::default(),
    };

    if let Some(path) = &args.wasm {
        config.payload = PayloadConfig::File { path: path.clone() };
    } else if let Some(path) = &args.data_uri_file {
        config.payload = PayloadConfig::Embedded {
            data_uri:      None,
            data_uri_file: Some(path.clone()),
        };
    }
    if args.no_start {
        config.binding.run_start = false;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    Ok(config)
}

async fn run(command: &Command, config: &BridgeConfig) -> Result<()> {
    let start = Instant::now();
    let bridge = Bridge::new(config).context("Invalid payload configuration")?;
    debug!(source = %bridge.source().describe(), "bridge created");

    let exports = bridge
        .initialize()
        .await
        .with_context(|| format!("Failed to initialize from {}", bridge.source().describe()))?;
    let load_time = start.elapsed();

    match command {
        Command::Check => {
            let stats = bridge.stats();
            info!(
                elapsed_ms = load_time.as_millis(),
                fetches = stats.payload_fetches,
                instantiations = stats.instantiations,
                "module ready"
            );
            println!("ok ({load_time:.2?})");
        },
        Command::Exports => {
            println!("bound:");
            for name in exports.export_names() {
                println!("  {name}");
            }
            println!("module:");
            for name in exports.module_exports() {
                println!("  {name}");
            }
        },
        Command::Hash {
            text,
            file,
            context,
        } => {
            let data = match (text, file) {
                (Some(text), _) => text.clone().into_bytes(),
                (None, Some(path)) => std::fs::read(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("nothing to hash"),
            };
            let digest = match context {
                Some(context) => exports.blake3_hash_once_with_context(&data, context.as_bytes()),
                None => exports.blake3_hash_once(&data),
            }
            .context("Hashing failed")?;
            println!("{}", hex::encode(digest));
        },
        Command::Nonce { material } => {
            let nonce = exports
                .generate_nonce(material.as_bytes())
                .context("Nonce derivation failed")?;
            println!("{}", hex::encode(nonce));
        },
    }
    Ok(())
}
