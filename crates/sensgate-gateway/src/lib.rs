// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # SensGate gateway
//!
//! Wires the connection manager, data manager and storage manager into one
//! running gateway.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sensgate_gateway::{Gateway, GatewayConfig, RoomMap, TracingSink};
//!
//! let config = GatewayConfig::from_file("sensgate.toml")?;
//! let rooms = RoomMap::from_file(&config.room_map)?;
//! let gateway = Gateway::bind("0.0.0.0:1234".parse()?, config, rooms, Arc::new(TracingSink))?;
//! let report = gateway.run()?;
//! ```

pub mod config;
pub mod datamgr;
pub mod error;
pub mod pipeline;
pub mod room_map;
pub mod sink;

pub use config::{ConfigError, GatewayConfig};
pub use datamgr::{DataConfig, DataManager, SensorStats};
pub use error::GatewayError;
pub use pipeline::{Gateway, GatewayReport};
pub use room_map::{RoomEntry, RoomId, RoomMap, RoomMapError};
pub use sink::TracingSink;
