// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway configuration.
//!
//! Every field has a default, so an empty TOML file is a valid
//! configuration:
//!
//! ```toml
//! idle_timeout_secs = 5
//! max_connections = 1024
//! room_map = "room_sensor.map"
//! database = "Sensor.db"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use sensgate::ConnMgrConfig;
use sensgate_logger::LogConfig;
use sensgate_storage::{SqliteOptions, StorageConfig};

use crate::datamgr::DataConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Inactivity limit for connections and for the connection manager (seconds).
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Connection table capacity.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Upper bound of one poll wait (milliseconds).
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Values per running average.
    #[serde(default = "default_run_avg_length")]
    pub run_avg_length: usize,

    /// Running averages below this are too cold.
    #[serde(default = "default_min_temp")]
    pub min_temp: f64,

    /// Running averages above this are too hot.
    #[serde(default = "default_max_temp")]
    pub max_temp: f64,

    /// Room map file.
    #[serde(default = "default_room_map")]
    pub room_map: PathBuf,

    /// FIFO between the gateway and the log process.
    #[serde(default = "default_fifo_path")]
    pub fifo_path: PathBuf,

    /// Event log file written by the log process.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// SQLite database file.
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Reading table.
    #[serde(default = "default_table")]
    pub table: String,

    /// Delete stored readings at startup.
    #[serde(default = "default_true")]
    pub clear_up: bool,

    /// Attempts per insert.
    #[serde(default = "default_attempts")]
    pub storage_attempts: u32,

    /// Pause between insert attempts (milliseconds).
    #[serde(default = "default_retry_ms")]
    pub storage_retry_ms: u64,

    /// Attempts to open the database.
    #[serde(default = "default_attempts")]
    pub connect_attempts: u32,

    /// Pause between open attempts (milliseconds).
    #[serde(default = "default_retry_ms")]
    pub connect_retry_ms: u64,

    /// Log process executable; looked up next to `sensgate` when unset.
    #[serde(default)]
    pub logger_bin: Option<PathBuf>,
}

fn default_idle_timeout() -> u64 {
    5
}

fn default_max_connections() -> usize {
    sensgate::connmgr::DEFAULT_MAX_CONNECTIONS
}

fn default_poll_interval() -> u64 {
    10
}

fn default_run_avg_length() -> usize {
    crate::datamgr::DEFAULT_RUN_AVG_LENGTH
}

fn default_min_temp() -> f64 {
    crate::datamgr::DEFAULT_MIN_TEMP
}

fn default_max_temp() -> f64 {
    crate::datamgr::DEFAULT_MAX_TEMP
}

fn default_room_map() -> PathBuf {
    PathBuf::from("room_sensor.map")
}

fn default_fifo_path() -> PathBuf {
    PathBuf::from(sensgate_logger::DEFAULT_FIFO)
}

fn default_log_file() -> PathBuf {
    PathBuf::from(sensgate_logger::DEFAULT_LOG_FILE)
}

fn default_database() -> PathBuf {
    PathBuf::from(sensgate_storage::DEFAULT_DATABASE)
}

fn default_table() -> String {
    sensgate_storage::DEFAULT_TABLE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_attempts() -> u32 {
    3
}

fn default_retry_ms() -> u64 {
    3000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout(),
            max_connections: default_max_connections(),
            poll_interval_ms: default_poll_interval(),
            run_avg_length: default_run_avg_length(),
            min_temp: default_min_temp(),
            max_temp: default_max_temp(),
            room_map: default_room_map(),
            fifo_path: default_fifo_path(),
            log_file: default_log_file(),
            database: default_database(),
            table: default_table(),
            clear_up: true,
            storage_attempts: default_attempts(),
            storage_retry_ms: default_retry_ms(),
            connect_attempts: default_attempts(),
            connect_retry_ms: default_retry_ms(),
            logger_bin: None,
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idle_timeout_secs == 0 {
            return Err(ConfigError::Invalid("idle_timeout_secs must be > 0".into()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid("max_connections must be > 0".into()));
        }
        if self.run_avg_length == 0 {
            return Err(ConfigError::Invalid("run_avg_length must be > 0".into()));
        }
        if !self.min_temp.is_finite() || !self.max_temp.is_finite() {
            return Err(ConfigError::Invalid("temperature bounds must be finite".into()));
        }
        if self.min_temp > self.max_temp {
            return Err(ConfigError::Invalid(format!(
                "min_temp ({}) is above max_temp ({})",
                self.min_temp, self.max_temp
            )));
        }
        if self.storage_attempts == 0 || self.connect_attempts == 0 {
            return Err(ConfigError::Invalid(
                "storage_attempts and connect_attempts must be > 0".into(),
            ));
        }
        if self.table.is_empty() {
            return Err(ConfigError::Invalid("table name is empty".into()));
        }
        Ok(())
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout_secs = timeout.as_secs();
        self
    }

    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn thresholds(mut self, min_temp: f64, max_temp: f64) -> Self {
        self.min_temp = min_temp;
        self.max_temp = max_temp;
        self
    }

    pub fn run_avg_length(mut self, length: usize) -> Self {
        self.run_avg_length = length;
        self
    }

    pub fn room_map(mut self, path: impl Into<PathBuf>) -> Self {
        self.room_map = path.into();
        self
    }

    pub fn database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database = path.into();
        self
    }

    pub fn fifo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fifo_path = path.into();
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = path.into();
        self
    }

    /// Retry delays for both opening and inserting.
    pub fn storage_retry(mut self, delay: Duration) -> Self {
        self.storage_retry_ms = delay.as_millis() as u64;
        self.connect_retry_ms = delay.as_millis() as u64;
        self
    }

    /// Put the FIFO, event log and database under `dir`.
    pub fn runtime_dir(self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let fifo = dir.join(&self.fifo_path);
        let log = dir.join(&self.log_file);
        let db = dir.join(&self.database);
        self.fifo_path(fifo).log_file(log).database(db)
    }

    pub fn idle_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn connmgr(&self) -> ConnMgrConfig {
        ConnMgrConfig::default()
            .idle_timeout(self.idle_timeout_duration())
            .max_connections(self.max_connections)
            .poll_interval(Duration::from_millis(self.poll_interval_ms))
    }

    pub fn datamgr(&self) -> DataConfig {
        DataConfig {
            run_avg_length: self.run_avg_length,
            min_temp: self.min_temp,
            max_temp: self.max_temp,
        }
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig::default()
            .connect_attempts(self.connect_attempts)
            .connect_delay(Duration::from_millis(self.connect_retry_ms))
            .insert_attempts(self.storage_attempts)
            .retry_delay(Duration::from_millis(self.storage_retry_ms))
    }

    pub fn sqlite(&self) -> SqliteOptions {
        SqliteOptions::file(&self.database)
            .table(self.table.as_str())
            .clear_up(self.clear_up)
    }

    pub fn log(&self) -> LogConfig {
        let config = LogConfig::new(&self.fifo_path, &self.log_file);
        match &self.logger_bin {
            Some(bin) => config.logger_bin(bin),
            None => config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GatewayConfig::default();
        assert_eq!(config.idle_timeout_secs, 5);
        assert_eq!(config.max_connections, 1024);
        assert_eq!(config.poll_interval_ms, 10);
        assert_eq!(config.run_avg_length, 5);
        assert_eq!(config.min_temp, 10.0);
        assert_eq!(config.max_temp, 20.0);
        assert_eq!(config.room_map, PathBuf::from("room_sensor.map"));
        assert_eq!(config.fifo_path, PathBuf::from("logFifo"));
        assert_eq!(config.log_file, PathBuf::from("gateway.log"));
        assert_eq!(config.database, PathBuf::from("Sensor.db"));
        assert_eq!(config.table, "SensorData");
        assert!(config.clear_up);
        assert_eq!(config.storage_attempts, 3);
        assert_eq!(config.storage_retry_ms, 3000);
        assert_eq!(config.connect_attempts, 3);
        assert_eq!(config.connect_retry_ms, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: GatewayConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_connections, 1024);
        assert_eq!(config.table, "SensorData");
    }

    #[test]
    fn test_partial_toml() {
        let config: GatewayConfig = toml::from_str(
            r#"
            idle_timeout_secs = 2
            max_temp = 24.5
            room_map = "/etc/sensgate/rooms.map"
            clear_up = false
            "#,
        )
        .unwrap();

        assert_eq!(config.idle_timeout_duration(), Duration::from_secs(2));
        assert_eq!(config.max_temp, 24.5);
        assert_eq!(config.min_temp, 10.0);
        assert!(!config.clear_up);
        assert!(!config.sqlite().clear_up);
        assert_eq!(config.connmgr().idle_timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_validate_rejects() {
        assert!(GatewayConfig::default().max_connections(0).validate().is_err());
        assert!(GatewayConfig::default().run_avg_length(0).validate().is_err());
        assert!(GatewayConfig::default()
            .thresholds(25.0, 15.0)
            .validate()
            .is_err());
        assert!(GatewayConfig::default()
            .idle_timeout(Duration::from_millis(500))
            .validate()
            .is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensgate.toml");
        std::fs::write(&path, "max_connections = 8\nstorage_attempts = 5\n").unwrap();

        let config = GatewayConfig::from_file(&path).unwrap();
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.storage().insert_attempts, 5);

        std::fs::write(&path, "max_connections = 0\n").unwrap();
        assert!(matches!(
            GatewayConfig::from_file(&path),
            Err(ConfigError::Invalid(_))
        ));

        std::fs::write(&path, "max_connections = \"many\"\n").unwrap();
        assert!(matches!(
            GatewayConfig::from_file(&path),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn test_runtime_dir() {
        let config = GatewayConfig::default().runtime_dir("/tmp/run");
        assert_eq!(config.fifo_path, PathBuf::from("/tmp/run/logFifo"));
        assert_eq!(config.log_file, PathBuf::from("/tmp/run/gateway.log"));
        assert_eq!(config.database, PathBuf::from("/tmp/run/Sensor.db"));
        assert_eq!(config.room_map, PathBuf::from("room_sensor.map"));
    }
}
