// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Storage stage
//!
//! Drains the aggregated reading queue into a [`ReadingStore`]. Opening the
//! store and each insert are retried a bounded number of times; running out
//! of attempts ends the stage.

use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sensgate::{EventSink, GatewayEvent, Reading, ReadingQueue};

use crate::sqlite::{SqliteOptions, SqliteStore};
use crate::store::ReadingStore;

/// Default number of attempts to open the store
pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;

/// Default number of attempts per insert
pub const DEFAULT_INSERT_ATTEMPTS: u32 = 3;

/// Default pause between two attempts
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Retry policy of the storage stage.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Attempts to open the store (at least 1)
    pub connect_attempts: u32,
    /// Pause between two open attempts
    pub connect_delay: Duration,
    /// Attempts per insert (at least 1)
    pub insert_attempts: u32,
    /// Pause between two insert attempts
    pub retry_delay: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            connect_delay: DEFAULT_RETRY_DELAY,
            insert_attempts: DEFAULT_INSERT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

impl StorageConfig {
    pub fn connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = attempts;
        self
    }

    pub fn connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = delay;
        self
    }

    pub fn insert_attempts(mut self, attempts: u32) -> Self {
        self.insert_attempts = attempts;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}

/// Why the storage stage stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageExit {
    /// The input queue stayed empty for a whole wait period
    QueueDrained,
    /// An insert kept failing after every attempt
    InsertFailed,
    /// The store could not be opened
    ConnectFailed,
}

/// Storage stage statistics
#[derive(Debug, Default)]
pub struct StorageStats {
    inserted: AtomicU64,
    retries: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`StorageStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStatsSnapshot {
    /// Readings persisted
    pub inserted: u64,
    /// Failed insert attempts that were retried
    pub retries: u64,
    /// Readings given up on
    pub failed: u64,
}

impl StorageStats {
    pub fn snapshot(&self) -> StorageStatsSnapshot {
        StorageStatsSnapshot {
            inserted: self.inserted.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Storage stage
pub struct StorageManager {
    config: StorageConfig,
    sink: Arc<dyn EventSink>,
    stats: Arc<StorageStats>,
}

impl StorageManager {
    pub fn new(config: StorageConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            sink,
            stats: Arc::new(StorageStats::default()),
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn stats(&self) -> Arc<StorageStats> {
        Arc::clone(&self.stats)
    }

    /// Call `open` until it succeeds, at most `connect_attempts` times.
    ///
    /// Every failure is reported as [`GatewayEvent::StorageUnavailable`].
    pub fn connect_with_retry<S, F>(&self, mut open: F) -> Option<S>
    where
        F: FnMut() -> Result<S>,
    {
        let attempts = self.config.connect_attempts.max(1);
        for attempt in 1..=attempts {
            match open() {
                Ok(store) => return Some(store),
                Err(e) => {
                    tracing::warn!(attempt, attempts, "failed to open store: {:#}", e);
                    self.sink.log(&GatewayEvent::StorageUnavailable {
                        error: format!("{:#}", e),
                    });
                    if attempt < attempts {
                        thread::sleep(self.config.connect_delay);
                    }
                }
            }
        }
        None
    }

    /// Open the SQLite store described by `options`, with retries.
    pub fn connect_sqlite(&self, options: &SqliteOptions) -> Option<SqliteStore> {
        let store = self.connect_with_retry(|| SqliteStore::open(options))?;

        self.sink.log(&GatewayEvent::StorageConnected);
        if store.table_created() {
            self.sink.log(&GatewayEvent::TableCreated {
                table: store.table().to_string(),
            });
        }
        tracing::info!(
            path = ?options.path,
            table = store.table(),
            clear_up = options.clear_up,
            "storage ready"
        );
        Some(store)
    }

    /// Open the SQLite store, then persist readings until the queue drains.
    pub fn run_sqlite(&self, options: &SqliteOptions, queue: &ReadingQueue) -> StorageExit {
        match self.connect_sqlite(options) {
            Some(store) => self.run(&store, queue),
            None => StorageExit::ConnectFailed,
        }
    }

    /// Persist readings from `queue` until it stays empty for a whole wait
    /// period or an insert exhausts its attempts.
    pub fn run(&self, store: &dyn ReadingStore, queue: &ReadingQueue) -> StorageExit {
        while let Some(reading) = queue.dequeue() {
            if !self.insert_with_retry(store, &reading) {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    sensor_id = reading.sensor_id,
                    attempts = self.config.insert_attempts,
                    "giving up on storage"
                );
                return StorageExit::InsertFailed;
            }
            self.stats.inserted.fetch_add(1, Ordering::Relaxed);
        }

        tracing::debug!(
            inserted = self.stats.inserted.load(Ordering::Relaxed),
            "storage queue drained"
        );
        StorageExit::QueueDrained
    }

    /// Every failed attempt is logged, the last one included.
    fn insert_with_retry(&self, store: &dyn ReadingStore, reading: &Reading) -> bool {
        let attempts = self.config.insert_attempts.max(1);
        for attempt in 1..=attempts {
            match store.insert(reading) {
                Ok(()) => return true,
                Err(e) => {
                    tracing::warn!(attempt, sensor_id = reading.sensor_id, "insert failed: {:#}", e);
                    self.sink.log(&GatewayEvent::StorageRetry { attempt });
                    if attempt < attempts {
                        self.stats.retries.fetch_add(1, Ordering::Relaxed);
                        thread::sleep(self.config.retry_delay);
                    }
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensgate::MemorySink;

    fn fast_config() -> StorageConfig {
        StorageConfig::default()
            .connect_delay(Duration::from_millis(1))
            .retry_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_connect_sqlite_reports_new_table() {
        let sink = Arc::new(MemorySink::new());
        let manager = StorageManager::new(fast_config(), sink.clone());

        let store = manager.connect_sqlite(&SqliteOptions::in_memory()).unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert_eq!(
            sink.lines(),
            vec![
                "Connection to SQL server established.",
                "New table SensorData created."
            ]
        );
    }

    #[test]
    fn test_connect_gives_up_after_attempts() {
        let sink = Arc::new(MemorySink::new());
        let manager = StorageManager::new(fast_config().connect_attempts(2), sink.clone());

        let mut calls = 0;
        let store: Option<()> = manager.connect_with_retry(|| {
            calls += 1;
            anyhow::bail!("database is locked")
        });

        assert!(store.is_none());
        assert_eq!(calls, 2);
        assert_eq!(
            sink.lines(),
            vec![
                "Unable to connect to SQL server : database is locked",
                "Unable to connect to SQL server : database is locked"
            ]
        );
    }

    #[test]
    fn test_connect_succeeds_on_later_attempt() {
        let sink = Arc::new(MemorySink::new());
        let manager = StorageManager::new(fast_config(), sink.clone());

        let mut calls = 0;
        let value = manager.connect_with_retry(|| {
            calls += 1;
            if calls < 3 {
                anyhow::bail!("not yet")
            }
            Ok(calls)
        });

        assert_eq!(value, Some(3));
        assert_eq!(sink.events().len(), 2);
    }

    #[test]
    fn test_run_drains_queue_into_store() {
        let sink = Arc::new(MemorySink::new());
        let manager = StorageManager::new(fast_config(), sink.clone());
        let store = SqliteStore::new_in_memory().unwrap();
        let queue = ReadingQueue::new(Duration::from_millis(20));

        for i in 0..10 {
            queue.enqueue(Reading::new(15, 20.0 + i as f64, 1000 + i));
        }

        assert_eq!(manager.run(&store, &queue), StorageExit::QueueDrained);
        let rows = store.find_all().unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[9].reading(), Reading::new(15, 29.0, 1009));
        assert_eq!(manager.stats().snapshot().inserted, 10);
        assert!(sink.events().is_empty());
    }
}
