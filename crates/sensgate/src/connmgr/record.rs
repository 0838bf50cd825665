// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-connection bookkeeping.

use std::cmp::Ordering;
use std::fmt;
use std::io::{self, Read};
use std::net::SocketAddr;
use std::time::Instant;

use mio::net::TcpStream;

use crate::reading::{Reading, ReadingDecoder, SensorId, Timestamp};

/// Size of the scratch buffer used to drain a socket.
const READ_CHUNK: usize = 4096;

/// Lifecycle of a sensor connection.
///
/// A record only exists while its connection is open; closing a connection
/// drops the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted, no complete reading yet
    Connected,
    /// At least one reading received
    Identified,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Identified => write!(f, "Identified"),
        }
    }
}

/// Result of one read from a connection socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReadOutcome {
    /// Bytes were added to the decoder; the socket may hold more
    Data,
    /// Nothing left to read until the next readiness event
    Drained,
    /// The connection ended
    Closed(CloseReason),
}

/// Why a connection was torn down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Orderly shutdown by the peer
    PeerClosed,
    /// Hard read error
    Error(io::ErrorKind),
    /// Nothing received for longer than the idle timeout
    Timeout,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::PeerClosed => write!(f, "closed by peer"),
            CloseReason::Error(kind) => write!(f, "read error ({:?})", kind),
            CloseReason::Timeout => write!(f, "idle timeout"),
        }
    }
}

/// One live sensor connection.
///
/// Records are ordered by arrival, which is how the tracking list keeps them.
#[derive(Debug)]
pub struct ConnectionRecord {
    seq: u64,
    slot: usize,
    pub(crate) stream: TcpStream,
    peer: SocketAddr,
    state: ConnectionState,
    sensor_id: SensorId,
    last_seen: Instant,
    last_timestamp: Option<Timestamp>,
    decoder: ReadingDecoder,
}

impl ConnectionRecord {
    pub(crate) fn new(
        seq: u64,
        slot: usize,
        stream: TcpStream,
        peer: SocketAddr,
        now: Instant,
    ) -> Self {
        Self {
            seq,
            slot,
            stream,
            peer,
            state: ConnectionState::Connected,
            sensor_id: 0,
            last_seen: now,
            last_timestamp: None,
            decoder: ReadingDecoder::new(),
        }
    }

    /// Arrival sequence number.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Slot in the connection table.
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Last sensor id seen on this connection, 0 before the first reading.
    pub fn sensor_id(&self) -> SensorId {
        self.sensor_id
    }

    pub fn last_seen(&self) -> Instant {
        self.last_seen
    }

    /// Timestamp carried by the most recent reading.
    pub fn last_timestamp(&self) -> Option<Timestamp> {
        self.last_timestamp
    }

    /// Bytes of a partial record waiting for the rest.
    pub fn pending_bytes(&self) -> usize {
        self.decoder.pending_len()
    }

    /// Read one chunk from the socket into the decoder.
    pub(crate) fn read_chunk(&mut self) -> ReadOutcome {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            match self.stream.read(&mut buf) {
                Ok(0) => return ReadOutcome::Closed(CloseReason::PeerClosed),
                Ok(n) => {
                    self.decoder.extend(&buf[..n]);
                    return ReadOutcome::Data;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return ReadOutcome::Drained,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return ReadOutcome::Closed(CloseReason::Error(e.kind())),
            }
        }
    }

    /// Next complete reading buffered for this connection.
    pub(crate) fn next_reading(&mut self) -> Option<Reading> {
        self.decoder.next_reading()
    }

    /// Record `reading` as the latest one. Returns true on the first reading.
    ///
    /// Only complete readings count as activity; stray bytes do not keep a
    /// connection alive.
    pub(crate) fn observe(&mut self, reading: &Reading, now: Instant) -> bool {
        let first = self.state == ConnectionState::Connected;
        self.state = ConnectionState::Identified;
        self.sensor_id = reading.sensor_id;
        self.last_seen = now;
        self.last_timestamp = Some(reading.timestamp);
        first
    }
}

impl PartialEq for ConnectionRecord {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for ConnectionRecord {}

impl PartialOrd for ConnectionRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ConnectionRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.seq.cmp(&other.seq)
    }
}
