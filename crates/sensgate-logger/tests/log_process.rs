// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic

//! End-to-end: stages write through the FIFO, the log process records them.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sensgate::{EventSink, GatewayEvent, Stage};
use sensgate_logger::{create_fifo, FifoSink, LogConfig, LogProcess};

fn parse(line: &str) -> (u64, i64, String) {
    let mut parts = line.splitn(3, ' ');
    let seq = parts.next().unwrap().parse().unwrap();
    let ts = parts.next().unwrap().parse().unwrap();
    let msg = parts.next().unwrap().to_string();
    (seq, ts, msg)
}

fn run_session(config: &LogConfig, process: LogProcess) -> Vec<(u64, i64, String)> {
    let sink = Arc::new(FifoSink::open(&config.fifo, Duration::from_secs(10)).unwrap());

    let writers: Vec<_> = [Stage::ConnectionManager, Stage::DataManager, Stage::StorageManager]
        .into_iter()
        .map(|stage| {
            let sink = Arc::clone(&sink);
            thread::spawn(move || {
                sink.log(&GatewayEvent::StageStarted(stage));
                for id in 0..50 {
                    sink.log(&GatewayEvent::InvalidSensor { sensor_id: id });
                }
                sink.log(&GatewayEvent::StageStopped(stage));
            })
        })
        .collect();
    for w in writers {
        w.join().unwrap();
    }

    sink.log(&GatewayEvent::Terminated);
    drop(sink);
    process.wait().unwrap();

    let path = match &config.output {
        sensgate_logger::OutputConfig::File { path } => path.clone(),
        sensgate_logger::OutputConfig::Stdout => unreachable!(),
    };
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(parse)
        .collect()
}

fn check_log(entries: &[(u64, i64, String)]) {
    // 3 stages x (start + 50 + stop), terminal message, closing line.
    assert_eq!(entries.len(), 3 * 52 + 2);

    for (i, (seq, ts, _)) in entries.iter().enumerate() {
        assert_eq!(*seq, i as u64);
        assert!(*ts > 0);
    }

    // Concurrent writers never interleave inside a line.
    for (_, _, msg) in entries {
        assert!(
            msg.ends_with("run...")
                || msg.ends_with("terminated...")
                || msg.starts_with("Received sensor data with invalid sensor node ID "),
            "mangled line: {:?}",
            msg
        );
    }

    let n = entries.len();
    assert_eq!(entries[n - 2].2, "Sensor gateway terminated...");
    assert_eq!(entries[n - 1].2, "Log process terminated...");
}

#[test]
fn log_thread_records_every_event_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = LogConfig::new(dir.path().join("logFifo"), dir.path().join("gateway.log"));
    create_fifo(&config.fifo).unwrap();

    let process = LogProcess::spawn_thread(&config).unwrap();
    assert_eq!(process.id(), None);

    check_log(&run_session(&config, process));
}

#[test]
fn log_process_binary_records_every_event_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = LogConfig::new(dir.path().join("logFifo"), dir.path().join("gateway.log"))
        .logger_bin(env!("CARGO_BIN_EXE_sensgate-logger"));
    create_fifo(&config.fifo).unwrap();

    let process = LogProcess::spawn(&config).unwrap();
    assert!(process.id().is_some());

    check_log(&run_session(&config, process));
}

#[test]
fn closing_fifo_without_terminal_message_still_closes_log() {
    let dir = tempfile::tempdir().unwrap();
    let config = LogConfig::new(dir.path().join("logFifo"), dir.path().join("gateway.log"));
    create_fifo(&config.fifo).unwrap();

    let process = LogProcess::spawn_thread(&config).unwrap();
    let sink = FifoSink::open(&config.fifo, Duration::from_secs(10)).unwrap();
    sink.log(&GatewayEvent::ManagerTimeout);
    drop(sink);
    process.wait().unwrap();

    let content = std::fs::read_to_string(dir.path().join("gateway.log")).unwrap();
    let messages: Vec<_> = content.lines().map(|l| parse(l).2).collect();
    assert_eq!(
        messages,
        vec!["connection manager timeout", "Log process terminated..."]
    );
}
