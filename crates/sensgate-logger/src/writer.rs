// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Log writer - turns raw FIFO lines into sequenced, timestamped entries.
//!
//! Output line format:
//!
//! ```text
//! <seq> <unix-seconds> <message>
//! ```
//!
//! `seq` starts at 0 and grows by one per line. The writer stops after the
//! gateway's terminal message or at end of stream, and always closes the log
//! with a final [`LOG_TERMINATED_MESSAGE`] entry.

use std::io::{self, BufRead};

use sensgate::TERMINATED_MESSAGE;

use crate::output::LogOutput;

/// Last line of every log.
pub const LOG_TERMINATED_MESSAGE: &str = "Log process terminated...";

/// Why [`LogWriter::run`] stopped reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The gateway sent its terminal message
    Terminated,
    /// Every writer closed the stream
    EndOfStream,
}

/// Writer statistics.
#[derive(Debug, Default, Clone, Copy)]
pub struct WriterStats {
    /// Lines received from the stream.
    pub lines_received: u64,
    /// Entries written to the output.
    pub lines_written: u64,
    /// Write errors.
    pub write_errors: u64,
}

/// Sequenced log writer.
pub struct LogWriter {
    output: Box<dyn LogOutput>,
    seq: u64,
    clock: fn() -> i64,
    stats: WriterStats,
}

impl LogWriter {
    /// Create a writer stamping entries with the wall clock.
    pub fn new(output: Box<dyn LogOutput>) -> Self {
        Self {
            output,
            seq: 0,
            clock: wall_clock,
            stats: WriterStats::default(),
        }
    }

    /// Replace the timestamp source.
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn stats(&self) -> WriterStats {
        self.stats
    }

    /// Sequence number the next entry will get.
    pub fn next_seq(&self) -> u64 {
        self.seq
    }

    /// Write one entry.
    pub fn write_entry(&mut self, message: &str) -> io::Result<()> {
        let line = format!("{} {} {}", self.seq, (self.clock)(), message);
        self.seq += 1;
        match self.output.write(&line) {
            Ok(()) => {
                self.stats.lines_written += 1;
                Ok(())
            }
            Err(e) => {
                self.stats.write_errors += 1;
                Err(e)
            }
        }
    }

    /// Copy lines from `reader` until the terminal message or end of stream.
    ///
    /// Failed writes are counted and skipped; only read errors abort.
    pub fn run<R: BufRead>(&mut self, mut reader: R) -> io::Result<EndReason> {
        let mut buf = Vec::new();

        let reason = loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break EndReason::EndOfStream;
            }
            self.stats.lines_received += 1;

            let text = String::from_utf8_lossy(&buf);
            let message = text.trim_end_matches(['\n', '\r']);
            if message.is_empty() {
                continue;
            }

            if let Err(e) = self.write_entry(message) {
                tracing::warn!("log write failed: {}", e);
            }

            if message == TERMINATED_MESSAGE {
                break EndReason::Terminated;
            }
        };

        if let Err(e) = self.write_entry(LOG_TERMINATED_MESSAGE) {
            tracing::warn!("log write failed: {}", e);
        }
        self.output.flush()?;

        tracing::debug!(
            lines_received = self.stats.lines_received,
            lines_written = self.stats.lines_written,
            reason = ?reason,
            "log writer finished"
        );
        Ok(reason)
    }
}

fn wall_clock() -> i64 {
    chrono::Utc::now().timestamp()
}
