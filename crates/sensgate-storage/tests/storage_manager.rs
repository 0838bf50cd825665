// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic

//! Storage stage against stores that fail on purpose.

use anyhow::{bail, Result};
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use sensgate::{GatewayEvent, MemorySink, Reading, ReadingQueue, Timestamp};
use sensgate_storage::{
    import_sensor_file, ReadingStore, SqliteOptions, SqliteStore, StorageConfig, StorageExit,
    StorageManager, StoredReading,
};

/// Store that rejects the first `failures` inserts, then accepts.
struct FlakyStore {
    failures: Mutex<u32>,
    rows: Mutex<Vec<Reading>>,
}

impl FlakyStore {
    fn new(failures: u32) -> Self {
        Self {
            failures: Mutex::new(failures),
            rows: Mutex::new(Vec::new()),
        }
    }
}

impl ReadingStore for FlakyStore {
    fn insert(&self, reading: &Reading) -> Result<()> {
        let mut failures = self.failures.lock();
        if *failures > 0 {
            *failures -= 1;
            bail!("disk I/O error");
        }
        self.rows.lock().push(*reading);
        Ok(())
    }

    fn find_all(&self) -> Result<Vec<StoredReading>> {
        Ok(self
            .rows
            .lock()
            .iter()
            .enumerate()
            .map(|(i, r)| StoredReading {
                id: i as i64 + 1,
                sensor_id: r.sensor_id,
                value: r.value,
                timestamp: r.timestamp,
            })
            .collect())
    }

    fn find_by_value(&self, value: f64) -> Result<Vec<StoredReading>> {
        Ok(self.find_all()?.into_iter().filter(|r| r.value == value).collect())
    }

    fn find_exceeding_value(&self, value: f64) -> Result<Vec<StoredReading>> {
        Ok(self.find_all()?.into_iter().filter(|r| r.value > value).collect())
    }

    fn find_by_timestamp(&self, ts: Timestamp) -> Result<Vec<StoredReading>> {
        Ok(self.find_all()?.into_iter().filter(|r| r.timestamp == ts).collect())
    }

    fn find_after_timestamp(&self, ts: Timestamp) -> Result<Vec<StoredReading>> {
        Ok(self.find_all()?.into_iter().filter(|r| r.timestamp > ts).collect())
    }

    fn count(&self) -> Result<u64> {
        Ok(self.rows.lock().len() as u64)
    }

    fn clear(&self) -> Result<()> {
        self.rows.lock().clear();
        Ok(())
    }
}

fn manager(sink: &Arc<MemorySink>) -> StorageManager {
    let config = StorageConfig::default()
        .connect_delay(Duration::from_millis(1))
        .retry_delay(Duration::from_millis(1));
    StorageManager::new(config, sink.clone())
}

fn queue_with(readings: &[Reading]) -> ReadingQueue {
    let queue = ReadingQueue::new(Duration::from_millis(20));
    for r in readings {
        queue.enqueue(*r);
    }
    queue
}

#[test]
fn transient_insert_failure_is_retried() {
    let sink = Arc::new(MemorySink::new());
    let store = FlakyStore::new(2);
    let queue = queue_with(&[Reading::new(15, 21.0, 1), Reading::new(21, 22.0, 2)]);

    let manager = manager(&sink);
    assert_eq!(manager.run(&store, &queue), StorageExit::QueueDrained);

    assert_eq!(store.count().unwrap(), 2);
    assert_eq!(
        sink.events(),
        vec![
            GatewayEvent::StorageRetry { attempt: 1 },
            GatewayEvent::StorageRetry { attempt: 2 },
        ]
    );
    let stats = manager.stats().snapshot();
    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.retries, 2);
    assert_eq!(stats.failed, 0);
}

#[test]
fn exhausted_insert_retries_end_the_stage() {
    let sink = Arc::new(MemorySink::new());
    let store = FlakyStore::new(u32::MAX);
    let queue = queue_with(&[Reading::new(15, 21.0, 1), Reading::new(21, 22.0, 2)]);

    let manager = manager(&sink);
    assert_eq!(manager.run(&store, &queue), StorageExit::InsertFailed);

    assert_eq!(store.count().unwrap(), 0);
    assert_eq!(
        sink.lines(),
        vec![
            "Connection to SQL server lost, try attempt times 1",
            "Connection to SQL server lost, try attempt times 2",
            "Connection to SQL server lost, try attempt times 3",
        ]
    );
    // The second reading is left in the queue.
    assert_eq!(queue.len(), 1);
    let stats = manager.stats().snapshot();
    assert_eq!(stats.failed, 1);
    // The third failure is not followed by another attempt.
    assert_eq!(stats.retries, 2);
}

#[test]
fn unopenable_database_fails_to_connect() {
    let dir = tempfile::tempdir().unwrap();
    let options = SqliteOptions::file(dir.path().join("missing").join("Sensor.db"));
    let sink = Arc::new(MemorySink::new());
    let queue = queue_with(&[Reading::new(15, 21.0, 1)]);

    let manager = manager(&sink);
    assert_eq!(manager.run_sqlite(&options, &queue), StorageExit::ConnectFailed);

    let lines = sink.lines();
    assert_eq!(lines.len(), 3);
    assert!(lines
        .iter()
        .all(|l| l.starts_with("Unable to connect to SQL server : ")));
    assert_eq!(queue.len(), 1);
}

#[test]
fn sqlite_stage_persists_queue_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let options = SqliteOptions::file(dir.path().join("Sensor.db"));
    let sink = Arc::new(MemorySink::new());
    let readings: Vec<_> = (0..25)
        .map(|i| Reading::new(100 + (i % 3) as u16, 15.0 + i as f64 / 4.0, 1_700_000_000 + i))
        .collect();
    let queue = queue_with(&readings);

    let manager = manager(&sink);
    assert_eq!(manager.run_sqlite(&options, &queue), StorageExit::QueueDrained);

    let store = SqliteStore::open(&options.clone().clear_up(false)).unwrap();
    let stored: Vec<_> = store.find_all().unwrap().iter().map(|r| r.reading()).collect();
    assert_eq!(stored, readings);
    assert!(sink.contains("Connection to SQL server established."));
    assert!(sink.contains("New table SensorData created."));
}

#[test]
fn import_sensor_file_skips_trailing_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sensor_data");
    let readings = [
        Reading::new(15, 18.5, 1000),
        Reading::new(21, 19.25, 1001),
        Reading::new(37, 22.0, 1002),
    ];
    {
        let mut file = std::fs::File::create(&path).unwrap();
        for r in &readings {
            file.write_all(&r.encode()).unwrap();
        }
        file.write_all(&[0xAB; 7]).unwrap();
    }

    let store = SqliteStore::new_in_memory().unwrap();
    assert_eq!(import_sensor_file(&store, &path).unwrap(), 3);
    let stored: Vec<_> = store.find_all().unwrap().iter().map(|r| r.reading()).collect();
    assert_eq!(stored, readings);
}
