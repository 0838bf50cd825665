// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SensGate storage query CLI
//!
//! Reads the reading table written by the gateway and prints matches as JSON.
//!
//! # Usage
//!
//! ```bash
//! # Every stored reading
//! sensgate-query all
//!
//! # Readings above 20 degrees
//! sensgate-query --db /var/lib/sensgate/Sensor.db exceeding 20
//!
//! # Load a binary sensor file into the table
//! sensgate-query import sensor_data
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sensgate_storage::{
    import_sensor_file, ReadingStore, SqliteOptions, SqliteStore, StoredReading,
    DEFAULT_DATABASE, DEFAULT_TABLE,
};
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "sensgate-query")]
#[command(author = "naskel.com")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query the sensor gateway reading database", long_about = None)]
struct Args {
    /// Database path (SQLite file)
    #[arg(short, long, default_value = DEFAULT_DATABASE)]
    db: PathBuf,

    /// Reading table
    #[arg(short, long, default_value = DEFAULT_TABLE)]
    table: String,

    /// Pretty-print JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Verbose mode (show internal logs)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Every stored reading
    All,
    /// Readings with exactly this value
    Value { value: f64 },
    /// Readings strictly above this value
    Exceeding { value: f64 },
    /// Readings taken at this Unix timestamp
    At { timestamp: i64 },
    /// Readings taken after this Unix timestamp
    After { timestamp: i64 },
    /// Number of stored readings
    Count,
    /// Bulk-insert a binary sensor file
    Import {
        /// File of back-to-back 18-byte records
        file: PathBuf,
    },
    /// Delete every stored reading
    Clear {
        /// Confirm deletion
        #[arg(long)]
        confirm: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("sensgate_storage=debug")
    } else {
        EnvFilter::new("sensgate_storage=warn")
    };
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let options = SqliteOptions::file(&args.db)
        .table(args.table.as_str())
        .clear_up(false);
    let store = SqliteStore::open(&options)
        .with_context(|| format!("Failed to open {}", args.db.display()))?;

    match args.command {
        Commands::All => print_rows(&store.find_all()?, args.pretty)?,
        Commands::Value { value } => print_rows(&store.find_by_value(value)?, args.pretty)?,
        Commands::Exceeding { value } => {
            print_rows(&store.find_exceeding_value(value)?, args.pretty)?
        }
        Commands::At { timestamp } => {
            print_rows(&store.find_by_timestamp(timestamp)?, args.pretty)?
        }
        Commands::After { timestamp } => {
            print_rows(&store.find_after_timestamp(timestamp)?, args.pretty)?
        }
        Commands::Count => println!("{}", store.count()?),
        Commands::Import { file } => {
            let n = import_sensor_file(&store, &file)?;
            println!("Imported {} readings from {}", n, file.display());
        }
        Commands::Clear { confirm } => {
            if confirm {
                store.clear()?;
                println!("All readings cleared.");
            } else {
                println!("Use --confirm to actually delete readings.");
            }
        }
    }

    Ok(())
}

fn print_rows(rows: &[StoredReading], pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(rows)?
    } else {
        serde_json::to_string(rows)?
    };
    println!("{}", json);
    Ok(())
}
