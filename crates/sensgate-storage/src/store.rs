// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reading store abstraction
//!
//! Defines the trait for storage backends and the persisted row type.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use sensgate::reading::{decode_all, Reading, SensorId, Timestamp, RECORD_SIZE};

/// A persisted reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    /// Auto-assigned row id
    pub id: i64,

    /// Sensor node id
    pub sensor_id: SensorId,

    /// Measured value
    pub value: f64,

    /// Sensor timestamp (Unix seconds)
    pub timestamp: Timestamp,
}

impl StoredReading {
    /// The reading this row was created from.
    pub fn reading(&self) -> Reading {
        Reading::new(self.sensor_id, self.value, self.timestamp)
    }
}

/// Reading store trait
///
/// Append-only persistence with simple filtered retrieval. Rows come back in
/// insertion order.
///
/// # Implementations
///
/// - `SqliteStore` -- Default, single file database
pub trait ReadingStore: Send + Sync {
    /// Append one reading
    fn insert(&self, reading: &Reading) -> Result<()>;

    /// Every stored reading
    fn find_all(&self) -> Result<Vec<StoredReading>>;

    /// Readings whose value equals `value`
    fn find_by_value(&self, value: f64) -> Result<Vec<StoredReading>>;

    /// Readings whose value is strictly greater than `value`
    fn find_exceeding_value(&self, value: f64) -> Result<Vec<StoredReading>>;

    /// Readings taken exactly at `ts`
    fn find_by_timestamp(&self, ts: Timestamp) -> Result<Vec<StoredReading>>;

    /// Readings taken strictly after `ts`
    fn find_after_timestamp(&self, ts: Timestamp) -> Result<Vec<StoredReading>>;

    /// Number of stored readings
    fn count(&self) -> Result<u64>;

    /// Delete every stored reading
    fn clear(&self) -> Result<()>;

    /// Append several readings, stopping at the first failure.
    fn insert_all(&self, readings: &[Reading]) -> Result<usize> {
        for (i, reading) in readings.iter().enumerate() {
            self.insert(reading)
                .with_context(|| format!("Failed to insert reading #{} ({:?})", i, reading))?;
        }
        Ok(readings.len())
    }
}

/// Bulk-load a binary sensor file (records in the wire layout, back to back).
///
/// Trailing bytes that do not form a whole record are ignored. Returns the
/// number of readings inserted.
pub fn import_sensor_file(store: &dyn ReadingStore, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read sensor file {}", path.display()))?;

    let trailing = bytes.len() % RECORD_SIZE;
    if trailing != 0 {
        tracing::warn!(
            path = %path.display(),
            trailing,
            "ignoring incomplete record at end of sensor file"
        );
    }

    store.insert_all(&decode_all(&bytes))
}
