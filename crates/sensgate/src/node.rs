// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sensor node client.
//!
//! A blocking TCP client that speaks the reading wire format. Used by the
//! `sensor-node` simulator and by tests.

use std::io::{self, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use crate::reading::{Reading, SensorId};

/// Connected sensor node.
#[derive(Debug)]
pub struct SensorNode {
    id: SensorId,
    stream: TcpStream,
    sent: u64,
}

impl SensorNode {
    /// Connect to the gateway at `addr` as sensor `id`.
    pub fn connect(addr: SocketAddr, id: SensorId) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, Duration::from_secs(5))?;
        stream.set_nodelay(true)?;
        Ok(Self {
            id,
            stream,
            sent: 0,
        })
    }

    pub fn id(&self) -> SensorId {
        self.id
    }

    /// Readings sent so far.
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Send `value` stamped with the current time.
    pub fn send_value(&mut self, value: f64) -> io::Result<()> {
        self.send(&Reading::now(self.id, value))
    }

    /// Send an arbitrary reading, whatever sensor id it carries.
    pub fn send(&mut self, reading: &Reading) -> io::Result<()> {
        self.stream.write_all(&reading.encode())?;
        self.sent += 1;
        Ok(())
    }

    /// Write raw bytes, e.g. an incomplete record.
    pub fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write_all(bytes)
    }

    /// Shut the connection down; the gateway sees an orderly close.
    pub fn close(self) -> io::Result<()> {
        self.stream.shutdown(Shutdown::Both)
    }
}
