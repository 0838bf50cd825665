// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Log process lifecycle.
//!
//! The gateway runs its log writer as a separate OS process
//! (`sensgate-logger`) found next to the running executable. When no such
//! executable exists the same writer runs on a thread instead.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::{Child, Command};
use std::thread::{self, JoinHandle};

use crate::output::{create_output, OutputConfig};
use crate::writer::{EndReason, LogWriter};
use crate::{LogConfig, LoggerError};

/// Name of the log process executable.
pub const LOGGER_BIN: &str = "sensgate-logger";

/// Handle on a running log writer.
#[derive(Debug)]
pub enum LogProcess {
    /// Separate OS process
    Child(Child),
    /// In-process writer thread
    Thread(JoinHandle<Result<EndReason, LoggerError>>),
}

impl LogProcess {
    /// Start the log process, falling back to a thread when the executable
    /// cannot be found.
    pub fn spawn(config: &LogConfig) -> Result<Self, LoggerError> {
        match locate_logger_binary(config) {
            Some(bin) => Self::spawn_child(bin, config),
            None => {
                tracing::info!("{} not found, running log writer in-process", LOGGER_BIN);
                Self::spawn_thread(config)
            }
        }
    }

    /// Start `bin` as the log process.
    pub fn spawn_child(bin: PathBuf, config: &LogConfig) -> Result<Self, LoggerError> {
        let mut cmd = Command::new(&bin);
        cmd.arg("--fifo").arg(&config.fifo);
        match &config.output {
            OutputConfig::File { path } => {
                cmd.arg("--output").arg(path);
            }
            OutputConfig::Stdout => {
                cmd.arg("--stdout");
            }
        }

        let child = cmd.spawn()?;
        tracing::debug!(pid = child.id(), bin = %bin.display(), "log process started");
        Ok(LogProcess::Child(child))
    }

    /// Run the log writer on a dedicated thread.
    pub fn spawn_thread(config: &LogConfig) -> Result<Self, LoggerError> {
        let config = config.clone();
        let handle = thread::Builder::new()
            .name("sensgate-logger".to_string())
            .spawn(move || run_log_writer(&config))?;
        Ok(LogProcess::Thread(handle))
    }

    /// OS process id, if the writer runs as a separate process.
    pub fn id(&self) -> Option<u32> {
        match self {
            LogProcess::Child(child) => Some(child.id()),
            LogProcess::Thread(_) => None,
        }
    }

    /// Wait for the writer to finish.
    pub fn wait(self) -> Result<(), LoggerError> {
        match self {
            LogProcess::Child(mut child) => {
                let status = child.wait()?;
                if status.success() {
                    Ok(())
                } else {
                    Err(LoggerError::ExitStatus(status))
                }
            }
            LogProcess::Thread(handle) => match handle.join() {
                Ok(result) => result.map(|_| ()),
                Err(_) => Err(LoggerError::Panicked),
            },
        }
    }
}

/// Read the FIFO named in `config` until the gateway terminates.
///
/// Opening the FIFO blocks until the gateway opens its write end.
pub fn run_log_writer(config: &LogConfig) -> Result<EndReason, LoggerError> {
    let output = create_output(&config.output)?;
    let fifo = File::open(&config.fifo)?;
    let mut writer = LogWriter::new(output);
    let reason = writer.run(BufReader::new(fifo))?;

    let stats = writer.stats();
    tracing::info!(
        lines_received = stats.lines_received,
        lines_written = stats.lines_written,
        write_errors = stats.write_errors,
        "log writer stopped"
    );
    Ok(reason)
}

fn locate_logger_binary(config: &LogConfig) -> Option<PathBuf> {
    if let Some(bin) = &config.logger_bin {
        return Some(bin.clone());
    }
    let exe = std::env::current_exe().ok()?;
    let candidate = exe
        .parent()?
        .join(format!("{}{}", LOGGER_BIN, std::env::consts::EXE_SUFFIX));
    candidate.is_file().then_some(candidate)
}
