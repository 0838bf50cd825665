// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Log process errors.
#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to create FIFO {path}: {source}")]
    CreateFifo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{0} exists and is not a FIFO")]
    NotAFifo(PathBuf),

    #[error("no log reader opened {path} within {waited:?}")]
    NoReader { path: PathBuf, waited: Duration },

    #[error("log process exited with {0}")]
    ExitStatus(ExitStatus),

    #[error("log writer thread panicked")]
    Panicked,
}
