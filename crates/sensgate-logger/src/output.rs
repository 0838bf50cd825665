// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Log output destinations: file or stdout.

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputConfig {
    /// Write to stdout.
    Stdout,
    /// Append to a file.
    File { path: PathBuf },
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig::File {
            path: PathBuf::from(crate::DEFAULT_LOG_FILE),
        }
    }
}

/// Destination of finished log lines.
pub trait LogOutput: Send {
    /// Write one line (without trailing newline).
    fn write(&mut self, line: &str) -> io::Result<()>;

    /// Flush buffered output.
    fn flush(&mut self) -> io::Result<()>;
}

/// Create an output from configuration.
pub fn create_output(config: &OutputConfig) -> io::Result<Box<dyn LogOutput>> {
    match config {
        OutputConfig::Stdout => Ok(Box::new(StdoutOutput)),
        OutputConfig::File { path } => Ok(Box::new(FileOutput::open(path)?)),
    }
}

/// Stdout output.
pub struct StdoutOutput;

impl LogOutput for StdoutOutput {
    fn write(&mut self, line: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", line)
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}

/// Append-only file output.
///
/// Every line is flushed as soon as it is written, so the file is current
/// even if the process is killed.
pub struct FileOutput {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl FileOutput {
    /// Open file for logging.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogOutput for FileOutput {
    fn write(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
