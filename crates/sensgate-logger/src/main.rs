// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SensGate log process CLI
//!
//! Reads gateway events from the FIFO and appends them to the event log.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: FIFO ./logFifo, log file ./gateway.log
//! sensgate-logger
//!
//! # Explicit paths
//! sensgate-logger --fifo /run/sensgate/fifo --output /var/log/sensgate.log
//!
//! # Echo entries to stdout instead of a file
//! sensgate-logger --stdout
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use sensgate_logger::{
    create_fifo, run_log_writer, LogConfig, OutputConfig, DEFAULT_FIFO, DEFAULT_LOG_FILE,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "sensgate-logger")]
#[command(author = "naskel.com")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Log process for the sensor gateway - sequenced event log fed through a FIFO")]
#[command(long_about = None)]
struct Cli {
    /// FIFO to read events from (created if missing)
    #[arg(short, long, default_value = DEFAULT_FIFO)]
    fifo: PathBuf,

    /// Event log file
    #[arg(short, long, default_value = DEFAULT_LOG_FILE)]
    output: PathBuf,

    /// Write entries to stdout instead of the log file
    #[arg(long)]
    stdout: bool,

    /// Verbose mode (show internal logs)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("sensgate_logger=debug")
    } else {
        EnvFilter::new("sensgate_logger=warn")
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Only the gateway ends the log (terminal message or closed FIFO).
    ctrlc::set_handler(|| tracing::debug!("interrupt received, waiting for gateway shutdown"))
        .context("Failed to install Ctrl+C handler")?;

    let config = LogConfig {
        fifo: cli.fifo.clone(),
        output: if cli.stdout {
            OutputConfig::Stdout
        } else {
            OutputConfig::File {
                path: cli.output.clone(),
            }
        },
        logger_bin: None,
    };

    let pid = std::process::id();
    println!("Log process {} is running...", pid);

    create_fifo(&config.fifo)
        .with_context(|| format!("Failed to prepare FIFO {}", config.fifo.display()))?;
    let reason = run_log_writer(&config).context("Log writer error")?;
    tracing::debug!(reason = ?reason, "log writer finished");

    println!("Log process {} terminated...", pid);
    Ok(())
}
