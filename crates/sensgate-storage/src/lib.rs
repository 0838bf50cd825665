// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! SensGate storage stage
//!
//! Persists every aggregated sensor reading.
//!
//! # Features
//!
//! - **SQLite Backend** -- Single file database, one row per reading
//! - **Bounded Retries** -- Opening the store and each insert are retried
//! - **Simple Queries** -- Filter by value or timestamp, bulk import
//!
//! # Architecture
//!
//! ```text
//! StorageManager
//! +-- ReadingQueue  (input, fed by the data manager)
//! +-- ReadingStore  (SqliteStore)
//! +-- EventSink     (connection and retry events)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sensgate_storage::{SqliteOptions, StorageConfig, StorageManager};
//!
//! let manager = StorageManager::new(StorageConfig::default(), sink);
//! let exit = manager.run_sqlite(&SqliteOptions::file("Sensor.db"), &queue);
//! ```

pub mod manager;
pub mod sqlite;
pub mod store;

pub use manager::{StorageConfig, StorageExit, StorageManager, StorageStats, StorageStatsSnapshot};
pub use sqlite::{SqliteOptions, SqliteStore, DEFAULT_DATABASE, DEFAULT_TABLE};
pub use store::{import_sensor_file, ReadingStore, StoredReading};
