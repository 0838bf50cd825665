// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The three gateway stages and the queues between them.
//!
//! ```text
//! sensgate-connmgr --readings--> sensgate-datamgr --aggregated--> sensgate-stgmgr
//!        |                              |                               |
//!        +------------------------------+-------------------------------+
//!                                       v
//!                                   EventSink
//! ```
//!
//! Each stage runs on its own named thread and cancels the shared
//! [`ShutdownToken`] when it returns, so the first stage to stop brings the
//! others down: the connection manager notices the token, the other two run
//! dry once their input stays empty.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use sensgate::connmgr::ConnMgrStatsSnapshot;
use sensgate::{
    ConnectionManager, EventSink, GatewayEvent, ManagerExit, ReadingQueue, ShutdownToken, Stage,
};
use sensgate_storage::{StorageExit, StorageManager, StorageStatsSnapshot};

use crate::config::GatewayConfig;
use crate::datamgr::DataManager;
use crate::error::GatewayError;
use crate::room_map::RoomMap;

/// What the stages reported when the gateway stopped.
#[derive(Debug, Clone)]
pub struct GatewayReport {
    pub connmgr: ManagerExit,
    pub connections: ConnMgrStatsSnapshot,
    /// Readings taken off the connection manager's queue
    pub processed: u64,
    pub storage: StorageExit,
    pub stored: StorageStatsSnapshot,
}

/// A bound, not yet running gateway.
pub struct Gateway {
    config: GatewayConfig,
    room_map: RoomMap,
    sink: Arc<dyn EventSink>,
    shutdown: ShutdownToken,
    manager: ConnectionManager,
    readings: Arc<ReadingQueue>,
    aggregated: Arc<ReadingQueue>,
}

impl Gateway {
    /// Bind the sensor listener at `addr`.
    pub fn bind(
        addr: SocketAddr,
        config: GatewayConfig,
        room_map: RoomMap,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let shutdown = ShutdownToken::new();
        let idle = config.idle_timeout_duration();
        let readings = Arc::new(ReadingQueue::for_idle_timeout(idle));
        let aggregated = Arc::new(ReadingQueue::for_idle_timeout(idle));

        let manager = ConnectionManager::bind(
            addr,
            config.connmgr(),
            Arc::clone(&readings),
            Arc::clone(&sink),
            shutdown.clone(),
        )
        .map_err(|source| GatewayError::Bind { addr, source })?;

        Ok(Self {
            config,
            room_map,
            sink,
            shutdown,
            manager,
            readings,
            aggregated,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.manager.local_addr()
    }

    /// Token that stops the gateway when cancelled.
    pub fn shutdown_token(&self) -> ShutdownToken {
        self.shutdown.clone()
    }

    /// Run every stage to completion.
    pub fn run(self) -> Result<GatewayReport, GatewayError> {
        let Gateway {
            config,
            room_map,
            sink,
            shutdown,
            manager,
            readings,
            aggregated,
        } = self;

        let conn_stats = manager.stats();

        let connmgr = spawn_stage(
            "sensgate-connmgr",
            Stage::ConnectionManager,
            &sink,
            &shutdown,
            move || manager.run(),
        )?;

        let datamgr = {
            let input = Arc::clone(&readings);
            let output = Arc::clone(&aggregated);
            let data_config = config.datamgr();
            let data_sink = Arc::clone(&sink);
            spawn_stage(
                "sensgate-datamgr",
                Stage::DataManager,
                &sink,
                &shutdown,
                move || DataManager::new(&room_map, data_config, data_sink).run(&input, &output),
            )?
        };

        let stgmgr = {
            let input = Arc::clone(&aggregated);
            let storage = StorageManager::new(config.storage(), Arc::clone(&sink));
            let options = config.sqlite();
            spawn_stage(
                "sensgate-stgmgr",
                Stage::StorageManager,
                &sink,
                &shutdown,
                move || {
                    let exit = storage.run_sqlite(&options, &input);
                    (exit, storage.stats().snapshot())
                },
            )?
        };

        let connmgr = join_stage(connmgr, Stage::ConnectionManager)?;
        let processed = join_stage(datamgr, Stage::DataManager)?;
        let (storage, stored) = join_stage(stgmgr, Stage::StorageManager)?;

        let report = GatewayReport {
            connmgr,
            connections: conn_stats.snapshot(),
            processed,
            storage,
            stored,
        };
        tracing::info!(?report, "gateway stopped");
        Ok(report)
    }
}

/// Run `body` on a named thread between the stage's start and stop events.
fn spawn_stage<T, F>(
    name: &str,
    stage: Stage,
    sink: &Arc<dyn EventSink>,
    shutdown: &ShutdownToken,
    body: F,
) -> Result<JoinHandle<T>, GatewayError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let sink = Arc::clone(sink);
    let shutdown = shutdown.clone();

    thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let _stop_all = shutdown.cancel_on_drop();
            sink.log(&GatewayEvent::StageStarted(stage));
            let result = body();
            sink.log(&GatewayEvent::StageStopped(stage));
            result
        })
        .map_err(|source| GatewayError::Spawn { stage, source })
}

fn join_stage<T>(handle: JoinHandle<T>, stage: Stage) -> Result<T, GatewayError> {
    handle.join().map_err(|_| GatewayError::StagePanicked(stage))
}
