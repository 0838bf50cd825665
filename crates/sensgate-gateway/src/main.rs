// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SensGate sensor gateway
//!
//! Accepts sensor node connections on a TCP port, computes running
//! temperature averages per room and stores every reading in SQLite. Events
//! go to the log process through a named FIFO.
//!
//! # Usage
//!
//! ```bash
//! # Serve sensors on port 1234 with the default file layout
//! sensgate 1234
//!
//! # With a configuration file
//! sensgate 1234 --config sensgate.toml
//!
//! # Keep the event log in tracing output instead of a log process
//! sensgate 1234 --no-log-process
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use sensgate::{EventSink, GatewayEvent};
use sensgate_gateway::{Gateway, GatewayConfig, RoomMap, TracingSink};
use sensgate_logger::{create_fifo, FifoSink, LogProcess};

#[derive(Parser, Debug)]
#[command(name = "sensgate")]
#[command(author = "naskel.com")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sensor gateway - TCP sensor ingestion, running averages and SQLite storage")]
#[command(long_about = None)]
struct Args {
    /// TCP server port number
    port: u16,

    /// Configuration file path (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Room map file (overrides the configuration)
    #[arg(short, long)]
    room_map: Option<PathBuf>,

    /// SQLite database (overrides the configuration)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// Event log file (overrides the configuration)
    #[arg(short, long)]
    log_file: Option<PathBuf>,

    /// Do not start the log process; events go to the tracing output
    #[arg(long)]
    no_log_process: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = build_config(&args)?;
    let room_map = RoomMap::from_file(&config.room_map)
        .with_context(|| format!("Failed to load room map {}", config.room_map.display()))?;

    let pid = std::process::id();
    println!("Main process {} is running...", pid);

    if args.no_log_process {
        serve(args.port, config, room_map, Arc::new(TracingSink))?;
    } else {
        run_with_log_process(args.port, config, room_map)?;
    }

    println!("Main process {} terminated...", pid);
    Ok(())
}

fn build_config(args: &Args) -> Result<GatewayConfig> {
    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => GatewayConfig::default(),
    };

    if let Some(path) = &args.room_map {
        config = config.room_map(path);
    }
    if let Some(path) = &args.database {
        config = config.database(path);
    }
    if let Some(path) = &args.log_file {
        config = config.log_file(path);
    }
    config.validate()?;
    Ok(config)
}

fn run_with_log_process(port: u16, config: GatewayConfig, room_map: RoomMap) -> Result<()> {
    let log_config = config.log();
    create_fifo(&log_config.fifo)
        .with_context(|| format!("Failed to create FIFO {}", log_config.fifo.display()))?;

    let process = LogProcess::spawn(&log_config).context("Failed to start log process")?;
    if let Some(log_pid) = process.id() {
        tracing::info!(pid = log_pid, "log process started");
    }

    let sink = Arc::new(
        FifoSink::open(&log_config.fifo, config.idle_timeout_duration())
            .context("Log process did not open the FIFO")?,
    );

    let result = serve(port, config, room_map, sink.clone());

    sink.log(&GatewayEvent::Terminated);
    drop(sink);
    process.wait().context("Log process failed")?;

    result
}

fn serve(
    port: u16,
    config: GatewayConfig,
    room_map: RoomMap,
    sink: Arc<dyn EventSink>,
) -> Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let gateway = Gateway::bind(addr, config, room_map, sink)?;

    let shutdown = gateway.shutdown_token();
    ctrlc::set_handler(move || shutdown.cancel()).context("Failed to install Ctrl+C handler")?;

    tracing::info!(addr = %gateway.local_addr(), "sensor gateway listening");
    let report = gateway.run()?;
    tracing::info!(
        accepted = report.connections.accepted,
        rejected = report.connections.rejected,
        processed = report.processed,
        stored = report.stored.inserted,
        "gateway finished"
    );
    Ok(())
}
