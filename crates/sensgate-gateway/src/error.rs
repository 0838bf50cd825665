// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use std::net::SocketAddr;
use thiserror::Error;

use sensgate::Stage;

use crate::config::ConfigError;
use crate::room_map::RoomMapError;

/// Gateway startup and shutdown errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("room map error: {0}")]
    RoomMap(#[from] RoomMapError),

    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot start {stage} thread: {source}")]
    Spawn {
        stage: Stage,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} thread panicked")]
    StagePanicked(Stage),
}
