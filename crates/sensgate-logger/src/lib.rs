// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SensGate log process
//!
//! Collects gateway events from a named FIFO and appends them to the event
//! log, one sequenced and timestamped line per event.
//!
//! # Features
//!
//! - **FIFO transport**: lock-free line writes from every stage thread
//! - **Sequenced output**: `<seq> <unix-seconds> <message>`
//! - **Lifecycle**: separate OS process, or an in-process thread fallback
//!
//! # Example
//!
//! ```rust,ignore
//! use sensgate_logger::{create_fifo, FifoSink, LogConfig, LogProcess};
//!
//! let config = LogConfig::new("logFifo", "gateway.log");
//! create_fifo(&config.fifo)?;
//! let process = LogProcess::spawn(&config)?;
//! let sink = FifoSink::open(&config.fifo, Duration::from_secs(5))?;
//! // ... stages log through `sink` ...
//! sink.log(&GatewayEvent::Terminated);
//! drop(sink);
//! process.wait()?;
//! ```

mod error;
mod fifo;
mod output;
mod process;
mod writer;

pub use error::LoggerError;
pub use fifo::{create_fifo, FifoSink};
pub use output::{create_output, FileOutput, LogOutput, OutputConfig, StdoutOutput};
pub use process::{run_log_writer, LogProcess, LOGGER_BIN};
pub use writer::{EndReason, LogWriter, WriterStats, LOG_TERMINATED_MESSAGE};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default FIFO path.
pub const DEFAULT_FIFO: &str = "logFifo";

/// Default event log file.
pub const DEFAULT_LOG_FILE: &str = "gateway.log";

/// Log process configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// FIFO the gateway writes events into.
    pub fifo: PathBuf,
    /// Where finished entries go.
    pub output: OutputConfig,
    /// Explicit log process executable; looked up next to the current
    /// executable when absent.
    #[serde(default)]
    pub logger_bin: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            fifo: PathBuf::from(DEFAULT_FIFO),
            output: OutputConfig::default(),
            logger_bin: None,
        }
    }
}

impl LogConfig {
    /// FIFO at `fifo`, entries appended to `log_file`.
    pub fn new(fifo: impl AsRef<Path>, log_file: impl AsRef<Path>) -> Self {
        Self {
            fifo: fifo.as_ref().to_path_buf(),
            output: OutputConfig::File {
                path: log_file.as_ref().to_path_buf(),
            },
            logger_bin: None,
        }
    }

    /// Use `bin` as the log process executable.
    pub fn logger_bin(mut self, bin: impl Into<PathBuf>) -> Self {
        self.logger_bin = Some(bin.into());
        self
    }
}
