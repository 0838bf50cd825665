// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Room map: which room every known sensor sits in.
//!
//! One `room_id sensor_id` pair per line, whitespace separated, each field
//! at most four decimal digits. Blank lines are ignored.
//!
//! ```text
//! 1 15
//! 2 21
//! 3 37
//! ```

use std::path::Path;
use thiserror::Error;

use sensgate::SensorId;

/// Room identifier.
pub type RoomId = u16;

/// Longest accepted field, in digits.
const MAX_FIELD_DIGITS: usize = 4;

/// Room map errors.
#[derive(Debug, Error)]
pub enum RoomMapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: expected `<room id> <sensor id>`, got {content:?}")]
    Malformed { line: usize, content: String },

    #[error("line {line}: {field} {value:?} is not a number of at most 4 digits")]
    BadField {
        line: usize,
        field: &'static str,
        value: String,
    },
}

/// One line of the room map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomEntry {
    pub room_id: RoomId,
    pub sensor_id: SensorId,
}

/// Parsed room map, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomMap {
    entries: Vec<RoomEntry>,
}

impl RoomMap {
    /// Load a room map file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RoomMapError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse room map text.
    pub fn parse(text: &str) -> Result<Self, RoomMapError> {
        let mut entries = Vec::new();

        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let mut fields = raw.split_whitespace();
            let (room, sensor) = match (fields.next(), fields.next(), fields.next()) {
                (None, _, _) => continue,
                (Some(room), Some(sensor), None) => (room, sensor),
                _ => {
                    return Err(RoomMapError::Malformed {
                        line,
                        content: raw.to_string(),
                    })
                }
            };

            entries.push(RoomEntry {
                room_id: parse_field(line, "room id", room)?,
                sensor_id: parse_field(line, "sensor id", sensor)?,
            });
        }

        Ok(Self { entries })
    }

    /// Entries in file order.
    pub fn entries(&self) -> &[RoomEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Room of `sensor_id`; a sensor listed twice resolves to its last line.
    pub fn room_of(&self, sensor_id: SensorId) -> Option<RoomId> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.sensor_id == sensor_id)
            .map(|e| e.room_id)
    }
}

impl FromIterator<(RoomId, SensorId)> for RoomMap {
    fn from_iter<I: IntoIterator<Item = (RoomId, SensorId)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(room_id, sensor_id)| RoomEntry { room_id, sensor_id })
                .collect(),
        }
    }
}

fn parse_field(line: usize, field: &'static str, value: &str) -> Result<u16, RoomMapError> {
    let bad = || RoomMapError::BadField {
        line,
        field,
        value: value.to_string(),
    };

    if value.is_empty()
        || value.len() > MAX_FIELD_DIGITS
        || !value.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(bad());
    }
    value.parse().map_err(|_| bad())
}
