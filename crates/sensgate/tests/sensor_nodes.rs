// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test code readability over pedantic
#![allow(clippy::float_cmp)] // Test assertions with constants

//! Sensor node clients against a live connection manager.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use sensgate::{
    ConnMgrConfig, ConnectionManager, EventSink, HandoffQueue, ManagerExit, MemorySink, Reading,
    SensorNode, ShutdownToken,
};

#[test]
fn nodes_stream_until_manager_idles_out() {
    let queue = Arc::new(HandoffQueue::new(Duration::from_secs(1)));
    let sink = Arc::new(MemorySink::new());
    let events: Arc<dyn EventSink> = sink.clone();
    let manager = ConnectionManager::bind(
        "127.0.0.1:0".parse().unwrap(),
        ConnMgrConfig::default().idle_timeout(Duration::from_millis(400)),
        Arc::clone(&queue),
        events,
        ShutdownToken::new(),
    )
    .unwrap();
    let addr = manager.local_addr();
    let stats = manager.stats();
    let gateway = thread::spawn(move || manager.run());

    let nodes: Vec<_> = [15u16, 21, 37]
        .into_iter()
        .map(|id| {
            thread::spawn(move || {
                let mut node = SensorNode::connect(addr, id).unwrap();
                for i in 0..5 {
                    node.send(&Reading::new(id, 18.0 + f64::from(i), 100 + i64::from(i)))
                        .unwrap();
                    thread::sleep(Duration::from_millis(10));
                }
                assert_eq!(node.sent(), 5);
                node.close().unwrap();
            })
        })
        .collect();
    for node in nodes {
        node.join().unwrap();
    }

    let mut readings = Vec::new();
    while let Some(r) = queue.dequeue() {
        readings.push(r);
        if readings.len() == 15 {
            break;
        }
    }
    assert_eq!(readings.len(), 15);

    assert_eq!(gateway.join().unwrap(), ManagerExit::Timeout);

    let lines = sink.lines();
    for id in [15, 21, 37] {
        assert!(lines.contains(&format!("A sensor node with {} has opened a new connection.", id)));
        assert!(lines.contains(&format!("The sensor node with {} has closed the connection.", id)));
    }
    assert_eq!(lines.last().map(String::as_str), Some("connection manager timeout"));

    let snap = stats.snapshot();
    assert_eq!(snap.accepted, 3);
    assert_eq!(snap.readings, 15);
    assert_eq!(snap.disconnected, 3);
    assert_eq!(snap.active, 0);
}

#[test]
fn incomplete_record_is_dropped_with_the_connection() {
    let queue = Arc::new(HandoffQueue::new(Duration::from_millis(500)));
    let sink = Arc::new(MemorySink::new());
    let shutdown = ShutdownToken::new();
    let manager = ConnectionManager::bind(
        "127.0.0.1:0".parse().unwrap(),
        ConnMgrConfig::default(),
        Arc::clone(&queue),
        sink.clone(),
        shutdown.clone(),
    )
    .unwrap();
    let addr = manager.local_addr();
    let gateway = thread::spawn(move || manager.run());

    let mut node = SensorNode::connect(addr, 9).unwrap();
    node.send_value(19.5).unwrap();
    node.send_raw(&Reading::new(9, 20.0, 0).encode()[..10]).unwrap();
    node.close().unwrap();

    let first = queue.dequeue().unwrap();
    assert_eq!(first.sensor_id, 9);
    assert_eq!(first.value, 19.5);
    assert_eq!(queue.dequeue(), None);
    assert!(sink.contains("The sensor node with 9 has closed the connection."));

    shutdown.cancel();
    assert_eq!(gateway.join().unwrap(), ManagerExit::Shutdown);
}
