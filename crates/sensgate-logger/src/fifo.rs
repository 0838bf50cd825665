// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Named FIFO between the gateway and the log process.
//!
//! Every event is written as one line of at most
//! [`LOG_LINE_MAX`](sensgate::sink::LOG_LINE_MAX) bytes with a single
//! `write` on the shared descriptor. Writes that small are atomic on a pipe,
//! so concurrent stages never interleave inside a line and no lock is taken.

use std::ffi::CString;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use sensgate::sink::{render_line, EventSink};
use sensgate::GatewayEvent;

use crate::LoggerError;

/// Delay between attempts to find a reader on the FIFO.
const OPEN_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Create the FIFO at `path`, or reuse an existing one.
pub fn create_fifo(path: &Path) -> Result<(), LoggerError> {
    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|e| {
        LoggerError::CreateFifo {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, e),
        }
    })?;

    // SAFETY: c_path is a valid NUL-terminated string that outlives the call.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), 0o666) };
    if rc == 0 {
        tracing::debug!(path = %path.display(), "FIFO created");
        return Ok(());
    }

    let err = io::Error::last_os_error();
    if err.kind() != io::ErrorKind::AlreadyExists {
        return Err(LoggerError::CreateFifo {
            path: path.to_path_buf(),
            source: err,
        });
    }

    let meta = std::fs::metadata(path)?;
    if meta.file_type().is_fifo() {
        Ok(())
    } else {
        Err(LoggerError::NotAFifo(path.to_path_buf()))
    }
}

/// Write end of the log FIFO.
#[derive(Debug)]
pub struct FifoSink {
    file: File,
    path: PathBuf,
}

impl FifoSink {
    /// Open the FIFO for writing once a reader has opened it.
    ///
    /// Gives up with [`LoggerError::NoReader`] after `wait`.
    pub fn open(path: impl AsRef<Path>, wait: Duration) -> Result<Self, LoggerError> {
        let path = path.as_ref().to_path_buf();
        let deadline = Instant::now() + wait;

        let file = loop {
            // Non-blocking open fails with ENXIO while nobody reads the FIFO.
            match OpenOptions::new()
                .write(true)
                .custom_flags(libc::O_NONBLOCK)
                .open(&path)
            {
                Ok(file) => break file,
                Err(e) if e.raw_os_error() == Some(libc::ENXIO) => {
                    if Instant::now() >= deadline {
                        return Err(LoggerError::NoReader { path, waited: wait });
                    }
                    thread::sleep(OPEN_RETRY_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        };

        set_blocking(&file)?;
        tracing::debug!(path = %path.display(), "log FIFO opened for writing");
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one pre-rendered line in a single call.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        (&self.file).write_all(line.as_bytes())
    }
}

impl EventSink for FifoSink {
    fn log(&self, event: &GatewayEvent) {
        if let Err(e) = self.write_line(&render_line(event)) {
            tracing::warn!(path = %self.path.display(), "event lost: {}", e);
        }
    }
}

/// Clear `O_NONBLOCK` so a full pipe makes writers wait instead of failing.
fn set_blocking(file: &File) -> io::Result<()> {
    let fd = file.as_raw_fd();
    // SAFETY: fd is a valid open descriptor owned by `file`.
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }
    // SAFETY: same descriptor, flags obtained from F_GETFL above.
    if unsafe { libc::fcntl(fd, libc::F_SETFL, flags & !libc::O_NONBLOCK) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};

    #[test]
    fn test_create_fifo_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fifo");
        create_fifo(&path).unwrap();
        create_fifo(&path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().file_type().is_fifo());
    }

    #[test]
    fn test_create_fifo_refuses_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain");
        std::fs::write(&path, b"x").unwrap();
        assert!(matches!(create_fifo(&path), Err(LoggerError::NotAFifo(_))));
    }

    #[test]
    fn test_open_without_reader_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fifo");
        create_fifo(&path).unwrap();

        let start = Instant::now();
        let result = FifoSink::open(&path, Duration::from_millis(50));
        assert!(matches!(result, Err(LoggerError::NoReader { .. })));
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn test_events_arrive_as_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fifo");
        create_fifo(&path).unwrap();

        let reader_path = path.clone();
        let reader = thread::spawn(move || {
            let file = File::open(reader_path).unwrap();
            BufReader::new(file)
                .lines()
                .collect::<Result<Vec<_>, _>>()
                .unwrap()
        });

        let sink = FifoSink::open(&path, Duration::from_secs(5)).unwrap();
        sink.log(&GatewayEvent::ManagerTimeout);
        sink.log(&GatewayEvent::InvalidSensor { sensor_id: 8 });
        drop(sink);

        let lines = reader.join().unwrap();
        assert_eq!(
            lines,
            vec![
                "connection manager timeout",
                "Received sensor data with invalid sensor node ID 8.",
            ]
        );
    }
}
