// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sensor readings and their wire layout.
//!
//! A reading travels as three consecutive native-endian fields with no
//! framing or padding:
//!
//! ```text
//! +-----------+-----------------+---------------------+
//! | id: u16   | value: f64      | timestamp: i64      |
//! | 2 bytes   | 8 bytes         | 8 bytes             |
//! +-----------+-----------------+---------------------+
//! ```
//!
//! Sensor binary files (`sensor_data`) use the same layout back to back.

use std::time::{SystemTime, UNIX_EPOCH};

/// Size of one encoded reading.
pub const RECORD_SIZE: usize = 2 + 8 + 8;

/// Sensor node identifier.
pub type SensorId = u16;

/// Seconds since the Unix epoch.
pub type Timestamp = i64;

/// One temperature sample reported by a sensor node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub sensor_id: SensorId,
    pub value: f64,
    pub timestamp: Timestamp,
}

impl Reading {
    pub fn new(sensor_id: SensorId, value: f64, timestamp: Timestamp) -> Self {
        Self {
            sensor_id,
            value,
            timestamp,
        }
    }

    /// Reading stamped with the current wall-clock time.
    pub fn now(sensor_id: SensorId, value: f64) -> Self {
        Self::new(sensor_id, value, unix_now())
    }

    /// Encode into the wire layout.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0..2].copy_from_slice(&self.sensor_id.to_ne_bytes());
        buf[2..10].copy_from_slice(&self.value.to_ne_bytes());
        buf[10..18].copy_from_slice(&self.timestamp.to_ne_bytes());
        buf
    }

    /// Decode one reading from the first [`RECORD_SIZE`] bytes of `bytes`.
    ///
    /// Returns `None` if fewer bytes are available.
    pub fn decode(bytes: &[u8]) -> Option<Self> {
        let record = bytes.get(..RECORD_SIZE)?;
        let mut id = [0u8; 2];
        let mut value = [0u8; 8];
        let mut ts = [0u8; 8];
        id.copy_from_slice(&record[0..2]);
        value.copy_from_slice(&record[2..10]);
        ts.copy_from_slice(&record[10..18]);
        Some(Self {
            sensor_id: u16::from_ne_bytes(id),
            value: f64::from_ne_bytes(value),
            timestamp: i64::from_ne_bytes(ts),
        })
    }
}

/// Current wall-clock time in seconds since the Unix epoch.
pub fn unix_now() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as Timestamp)
        .unwrap_or(0)
}

/// Decode every complete record in `bytes`; trailing partial bytes are ignored.
pub fn decode_all(bytes: &[u8]) -> Vec<Reading> {
    bytes
        .chunks_exact(RECORD_SIZE)
        .filter_map(Reading::decode)
        .collect()
}

// ============================================================================
// Stream decoder
// ============================================================================

/// Reassembles readings from a byte stream delivered in arbitrary pieces.
#[derive(Debug, Default)]
pub struct ReadingDecoder {
    pending: Vec<u8>,
}

impl ReadingDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append received bytes.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
    }

    /// Pop the next complete reading, if one is buffered.
    pub fn next_reading(&mut self) -> Option<Reading> {
        let reading = Reading::decode(&self.pending)?;
        self.pending.drain(..RECORD_SIZE);
        Some(reading)
    }

    /// Bytes of an incomplete record still waiting for the rest.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
