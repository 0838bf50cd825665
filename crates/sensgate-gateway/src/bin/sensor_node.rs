// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sensor node simulator
//!
//! Connects to a gateway and sends temperature readings at a fixed pace.
//!
//! # Usage
//!
//! ```bash
//! # Sensor 15, one reading per second until interrupted
//! sensor-node 15 127.0.0.1:1234
//!
//! # 20 readings, 200 ms apart, around 25 degrees
//! sensor-node 15 127.0.0.1:1234 --count 20 --interval-ms 200 --mean 25
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::thread;
use std::time::Duration;
use tracing_subscriber::{fmt, EnvFilter};

use sensgate::SensorNode;

#[derive(Parser, Debug)]
#[command(name = "sensor-node")]
#[command(author = "naskel.com")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Sensor node simulator for the sensor gateway")]
#[command(long_about = None)]
struct Args {
    /// Sensor node id
    id: u16,

    /// Gateway address
    gateway: SocketAddr,

    /// Pause between readings (milliseconds)
    #[arg(short, long, default_value_t = 1000)]
    interval_ms: u64,

    /// Number of readings to send (0 = until interrupted)
    #[arg(short, long, default_value_t = 0)]
    count: u64,

    /// Mean temperature
    #[arg(long, default_value_t = 15.0)]
    mean: f64,

    /// Maximum deviation from the mean
    #[arg(long, default_value_t = 5.0)]
    spread: f64,

    /// Verbose mode (print every reading)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("sensor_node=debug")
    } else {
        EnvFilter::new("sensor_node=info")
    };
    fmt().with_env_filter(filter).with_target(false).init();

    let mut node = SensorNode::connect(args.gateway, args.id)
        .with_context(|| format!("Failed to connect to {}", args.gateway))?;
    tracing::info!(id = args.id, gateway = %args.gateway, "connected");

    let interval = Duration::from_millis(args.interval_ms);
    while args.count == 0 || node.sent() < args.count {
        let value = args.mean + (fastrand::f64() * 2.0 - 1.0) * args.spread;
        node.send_value(value).context("Gateway closed the connection")?;
        tracing::debug!(id = args.id, value, "reading sent");
        thread::sleep(interval);
    }

    tracing::info!(sent = node.sent(), "done");
    node.close()?;
    Ok(())
}
