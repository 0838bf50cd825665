// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway events written to the event log.
//!
//! Every stage reports what happens to it as a [`GatewayEvent`]. The
//! `Display` form of an event is the exact line text the log process records.

use std::fmt;

use crate::reading::SensorId;

/// Line sent to the log process when the gateway shuts down.
pub const TERMINATED_MESSAGE: &str = "Sensor gateway terminated...";

/// Pipeline stage named in lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ConnectionManager,
    DataManager,
    StorageManager,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::ConnectionManager => write!(f, "connection manager"),
            Stage::DataManager => write!(f, "data manager"),
            Stage::StorageManager => write!(f, "storage manager"),
        }
    }
}

/// Events produced by the gateway stages.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    /// Stage thread started
    StageStarted(Stage),

    /// Stage thread finished
    StageStopped(Stage),

    /// First reading received on a new connection
    SensorConnected {
        /// Sensor id carried by that reading
        sensor_id: SensorId,
    },

    /// Connection closed by the peer, lost, or timed out
    SensorDisconnected {
        /// Last sensor id seen on the connection (0 if none)
        sensor_id: SensorId,
    },

    /// No connection existed for a whole idle timeout
    ManagerTimeout,

    /// Reading from a sensor missing from the room map
    InvalidSensor {
        /// Unknown sensor id
        sensor_id: SensorId,
    },

    /// Running average above the upper threshold
    TooHot {
        /// Reporting sensor
        sensor_id: SensorId,
        /// Running average
        avg: f64,
    },

    /// Running average below the lower threshold
    TooCold {
        /// Reporting sensor
        sensor_id: SensorId,
        /// Running average
        avg: f64,
    },

    /// Storage opened
    StorageConnected,

    /// Storage could not be opened
    StorageUnavailable {
        /// Error description
        error: String,
    },

    /// Reading table created
    TableCreated {
        /// Table name
        table: String,
    },

    /// An insert failed and is being retried
    StorageRetry {
        /// 1-based attempt that failed
        attempt: u32,
    },

    /// Gateway shutting down; last line the log process waits for
    Terminated,

    /// Free-form line
    Message(String),
}

impl fmt::Display for GatewayEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayEvent::StageStarted(stage) => write!(f, "{} run...", stage),
            GatewayEvent::StageStopped(stage) => write!(f, "{} terminated...", stage),
            GatewayEvent::SensorConnected { sensor_id } => write!(
                f,
                "A sensor node with {} has opened a new connection.",
                sensor_id
            ),
            GatewayEvent::SensorDisconnected { sensor_id } => write!(
                f,
                "The sensor node with {} has closed the connection.",
                sensor_id
            ),
            GatewayEvent::ManagerTimeout => write!(f, "connection manager timeout"),
            GatewayEvent::InvalidSensor { sensor_id } => write!(
                f,
                "Received sensor data with invalid sensor node ID {}.",
                sensor_id
            ),
            GatewayEvent::TooHot { sensor_id, avg } => write!(
                f,
                "The sensor node with {} reports it's too hot (running avg temperature = {}).",
                sensor_id, avg
            ),
            GatewayEvent::TooCold { sensor_id, avg } => write!(
                f,
                "The sensor node with {} reports it's too cold (running avg temperature = {}).",
                sensor_id, avg
            ),
            GatewayEvent::StorageConnected => write!(f, "Connection to SQL server established."),
            GatewayEvent::StorageUnavailable { error } => {
                write!(f, "Unable to connect to SQL server : {}", error)
            }
            GatewayEvent::TableCreated { table } => write!(f, "New table {} created.", table),
            GatewayEvent::StorageRetry { attempt } => write!(
                f,
                "Connection to SQL server lost, try attempt times {}",
                attempt
            ),
            GatewayEvent::Terminated => f.write_str(TERMINATED_MESSAGE),
            GatewayEvent::Message(text) => f.write_str(text),
        }
    }
}
