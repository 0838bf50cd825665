// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Data manager: per-sensor running averages.
//!
//! Readings from sensors missing from the room map are reported and
//! dropped. Every other reading is forwarded to the storage queue and pushed
//! into its sensor's window; once the window is full its average is checked
//! against the comfort range.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::sync::Arc;

use sensgate::{DpList, EventSink, GatewayEvent, Reading, ReadingQueue, SensorId, Timestamp};

use crate::room_map::{RoomId, RoomMap};

/// Default running average window
pub const DEFAULT_RUN_AVG_LENGTH: usize = 5;

/// Default lower comfort bound
pub const DEFAULT_MIN_TEMP: f64 = 10.0;

/// Default upper comfort bound
pub const DEFAULT_MAX_TEMP: f64 = 20.0;

/// Data manager settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataConfig {
    /// Values averaged per sensor (at least 1)
    pub run_avg_length: usize,
    /// Averages below this are too cold
    pub min_temp: f64,
    /// Averages above this are too hot
    pub max_temp: f64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            run_avg_length: DEFAULT_RUN_AVG_LENGTH,
            min_temp: DEFAULT_MIN_TEMP,
            max_temp: DEFAULT_MAX_TEMP,
        }
    }
}

/// State kept for one sensor of the room map.
///
/// Ordered and compared by sensor id only, so the sensor index can be
/// searched with a bare [`SensorId`].
#[derive(Debug, Clone)]
pub struct SensorStats {
    sensor_id: SensorId,
    room_id: RoomId,
    window: Vec<f64>,
    count: u64,
    last_modified: Timestamp,
}

impl SensorStats {
    fn new(sensor_id: SensorId, room_id: RoomId, window: usize) -> Self {
        Self {
            sensor_id,
            room_id,
            window: vec![0.0; window.max(1)],
            count: 0,
            last_modified: 0,
        }
    }

    pub fn sensor_id(&self) -> SensorId {
        self.sensor_id
    }

    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Values recorded so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Timestamp of the last reading that updated the window (0 if none).
    pub fn last_modified(&self) -> Timestamp {
        self.last_modified
    }

    /// Average of the window, once it is full.
    pub fn average(&self) -> Option<f64> {
        let len = self.window.len();
        if (self.count as usize) < len {
            return None;
        }
        Some(self.window.iter().sum::<f64>() / len as f64)
    }

    fn record(&mut self, reading: &Reading) {
        let len = self.window.len();
        self.window[(self.count % len as u64) as usize] = reading.value;
        self.count += 1;
        self.last_modified = reading.timestamp;
    }
}

impl Borrow<SensorId> for SensorStats {
    fn borrow(&self) -> &SensorId {
        &self.sensor_id
    }
}

impl PartialEq for SensorStats {
    fn eq(&self, other: &Self) -> bool {
        self.sensor_id == other.sensor_id
    }
}

impl Eq for SensorStats {}

impl PartialOrd for SensorStats {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SensorStats {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sensor_id.cmp(&other.sensor_id)
    }
}

/// Running averages over every sensor of the room map.
pub struct DataManager {
    config: DataConfig,
    sensors: DpList<SensorStats>,
    sink: Arc<dyn EventSink>,
}

impl DataManager {
    pub fn new(map: &RoomMap, config: DataConfig, sink: Arc<dyn EventSink>) -> Self {
        let mut sensors = DpList::new();
        for entry in map.entries() {
            sensors.insert_at_index(
                SensorStats::new(entry.sensor_id, entry.room_id, config.run_avg_length),
                0,
            );
        }

        tracing::debug!(
            sensors = map.len(),
            window = config.run_avg_length,
            "data manager ready"
        );

        Self {
            config,
            sensors,
            sink,
        }
    }

    pub fn config(&self) -> &DataConfig {
        &self.config
    }

    /// Handle one reading. Returns false if the sensor is unknown.
    pub fn process(&mut self, reading: Reading, output: &ReadingQueue) -> bool {
        let Some(node) = self.sensors.get_reference_of_element(&reading.sensor_id) else {
            self.sink.log(&GatewayEvent::InvalidSensor {
                sensor_id: reading.sensor_id,
            });
            return false;
        };

        output.enqueue(reading);

        let Some(sensor) = self.sensors.get_element_at_reference_mut(node) else {
            return true;
        };
        sensor.record(&reading);

        if let Some(avg) = sensor.average() {
            if avg > self.config.max_temp {
                self.sink.log(&GatewayEvent::TooHot {
                    sensor_id: sensor.sensor_id,
                    avg,
                });
            } else if avg < self.config.min_temp {
                self.sink.log(&GatewayEvent::TooCold {
                    sensor_id: sensor.sensor_id,
                    avg,
                });
            }
        }
        true
    }

    /// Process readings from `input` until it stays empty for a whole wait
    /// period. Returns the number of readings handled.
    pub fn run(&mut self, input: &ReadingQueue, output: &ReadingQueue) -> u64 {
        let mut handled = 0;
        let mut invalid = 0;
        while let Some(reading) = input.dequeue() {
            if !self.process(reading, output) {
                invalid += 1;
            }
            handled += 1;
        }
        tracing::debug!(handled, invalid, "data manager input drained");
        handled
    }

    fn sensor(&self, sensor_id: SensorId) -> Option<&SensorStats> {
        let node = self.sensors.get_reference_of_element(&sensor_id)?;
        self.sensors.get_element_at_reference(Some(node))
    }

    /// Room the sensor sits in.
    pub fn room_id(&self, sensor_id: SensorId) -> Option<RoomId> {
        self.sensor(sensor_id).map(SensorStats::room_id)
    }

    /// Running average of the sensor; 0.0 until its window is full.
    pub fn running_avg(&self, sensor_id: SensorId) -> Option<f64> {
        self.sensor(sensor_id).map(|s| s.average().unwrap_or(0.0))
    }

    /// Timestamp of the sensor's last accepted reading.
    pub fn last_modified(&self, sensor_id: SensorId) -> Option<Timestamp> {
        self.sensor(sensor_id).map(SensorStats::last_modified)
    }

    /// Number of sensors in the index.
    pub fn total_sensors(&self) -> usize {
        self.sensors.size()
    }

    /// Sensors, most recently listed in the room map first.
    pub fn sensors(&self) -> impl Iterator<Item = &SensorStats> {
        self.sensors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensgate::MemorySink;
    use std::time::Duration;

    fn setup() -> (DataManager, Arc<MemorySink>, ReadingQueue) {
        let map: RoomMap = [(1, 15), (2, 21), (3, 37)].into_iter().collect();
        let sink = Arc::new(MemorySink::new());
        let manager = DataManager::new(&map, DataConfig::default(), sink.clone());
        (manager, sink, ReadingQueue::new(Duration::from_millis(10)))
    }

    #[test]
    fn test_index_built_from_map() {
        let (manager, _, _) = setup();
        assert_eq!(manager.total_sensors(), 3);
        assert_eq!(manager.room_id(21), Some(2));
        assert_eq!(manager.room_id(99), None);
        let order: Vec<_> = manager.sensors().map(|s| s.sensor_id()).collect();
        assert_eq!(order, vec![37, 21, 15]);
    }

    #[test]
    fn test_average_needs_full_window() {
        let (mut manager, sink, out) = setup();
        for i in 0..4 {
            manager.process(Reading::new(15, 30.0, 100 + i), &out);
        }
        assert_eq!(manager.running_avg(15), Some(0.0));
        assert!(sink.events().is_empty());

        manager.process(Reading::new(15, 30.0, 104), &out);
        assert_eq!(manager.running_avg(15), Some(30.0));
        assert_eq!(manager.last_modified(15), Some(104));
        assert_eq!(out.len(), 5);
        assert_eq!(
            sink.events(),
            vec![GatewayEvent::TooHot {
                sensor_id: 15,
                avg: 30.0
            }]
        );
    }

    #[test]
    fn test_window_slides() {
        let (mut manager, sink, out) = setup();
        for _ in 0..5 {
            manager.process(Reading::new(21, 15.0, 1), &out);
        }
        assert_eq!(manager.running_avg(21), Some(15.0));

        for _ in 0..5 {
            manager.process(Reading::new(21, 5.0, 2), &out);
        }
        assert_eq!(manager.running_avg(21), Some(5.0));

        let cold = sink
            .events()
            .into_iter()
            .filter(|e| matches!(e, GatewayEvent::TooCold { sensor_id: 21, .. }))
            .count();
        // Averages 13, 11, 9, 7, 5 while the window refills.
        assert_eq!(cold, 3);
    }

    #[test]
    fn test_unknown_sensor_dropped() {
        let (mut manager, sink, out) = setup();
        assert!(!manager.process(Reading::new(999, 20.0, 1), &out));
        assert!(out.is_empty());
        assert_eq!(
            sink.lines(),
            vec!["Received sensor data with invalid sensor node ID 999."]
        );
        assert_eq!(manager.running_avg(999), None);
    }

    #[test]
    fn test_run_forwards_in_order() {
        let (mut manager, _, out) = setup();
        let input = ReadingQueue::new(Duration::from_millis(10));
        input.enqueue(Reading::new(15, 12.0, 1));
        input.enqueue(Reading::new(5, 12.0, 2));
        input.enqueue(Reading::new(37, 13.0, 3));

        assert_eq!(manager.run(&input, &out), 3);
        assert_eq!(out.try_dequeue().map(|r| r.sensor_id), Some(15));
        assert_eq!(out.try_dequeue().map(|r| r.sensor_id), Some(37));
        assert!(out.is_empty());
    }

    #[test]
    fn test_window_of_one() {
        let map: RoomMap = [(1, 15)].into_iter().collect();
        let sink = Arc::new(MemorySink::new());
        let config = DataConfig {
            run_avg_length: 1,
            ..Default::default()
        };
        let mut manager = DataManager::new(&map, config, sink.clone());
        let out = ReadingQueue::new(Duration::from_millis(10));

        manager.process(Reading::new(15, 25.0, 1), &out);
        manager.process(Reading::new(15, 15.0, 2), &out);
        manager.process(Reading::new(15, 5.0, 3), &out);
        assert_eq!(
            sink.lines(),
            vec![
                "The sensor node with 15 reports it's too hot (running avg temperature = 25).",
                "The sensor node with 15 reports it's too cold (running avg temperature = 5).",
            ]
        );
    }
}
