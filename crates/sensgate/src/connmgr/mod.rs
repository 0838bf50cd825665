// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection manager.
//!
//! Owns the listening socket and every sensor connection, multiplexed on one
//! `mio::Poll`. Readings decoded from the sockets are forwarded to the
//! downstream [`ReadingQueue`].
//!
//! # Architecture
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                     ConnectionManager                         |
//! |  +--------------------------------------------------------+  |
//! |  |                      mio::Poll                          |  |
//! |  |  - Token(0)      listener (accept)                      |  |
//! |  |  - Token(i + 1)  connection in slot i (read)            |  |
//! |  +--------------------------------------------------------+  |
//! |          |                                |                   |
//! |          v                                v                   |
//! |  +---------------+               +------------------+        |
//! |  | slot table    |  NodeRef ---> | DpList of        |        |
//! |  | (fixed size)  |               | ConnectionRecord |        |
//! |  +---------------+               +------------------+        |
//! |                                           |                   |
//! |                                           v                   |
//! |                                   ReadingQueue -> downstream  |
//! +--------------------------------------------------------------+
//! ```
//!
//! # Timeouts
//!
//! A connection that delivers no complete reading for longer than the idle
//! timeout is closed; inactivity is measured on the gateway clock, not on
//! the timestamps sensors put in their readings. When no connection at all has
//! existed for a whole idle timeout the manager logs
//! [`GatewayEvent::ManagerTimeout`] and returns.
//!
//! # Fairness
//!
//! Each readiness event reads at most a fixed number of chunks from one
//! socket, decoding as it goes. A connection with data left over is served
//! again on the next loop iteration, after the other ready connections.
//!
//! # Admission
//!
//! The slot table has a fixed capacity. A connection accepted while every
//! slot is taken is closed immediately; it is counted in
//! [`ConnMgrStatsSnapshot::rejected`] and never appears in the event log.

mod record;
mod stats;

pub use record::{CloseReason, ConnectionRecord, ConnectionState};
use record::ReadOutcome;
pub use stats::{ConnMgrStats, ConnMgrStatsSnapshot};

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mio::net::{TcpListener, TcpStream};
use mio::{Events, Interest, Poll, Token};

use crate::event::GatewayEvent;
use crate::list::{DpList, NodeRef};
use crate::sbuffer::ReadingQueue;
use crate::shutdown::ShutdownToken;
use crate::sink::EventSink;

// ============================================================================
// Constants
// ============================================================================

/// Token for the TCP listener
const LISTENER_TOKEN: Token = Token(0);

/// Maximum events to process per poll
const MAX_EVENTS: usize = 256;

/// Default inactivity limit for connections and for the manager itself
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Socket reads served per connection before the others get a turn
const MAX_READS_PER_EVENT: usize = 16;

/// Default connection table capacity
pub const DEFAULT_MAX_CONNECTIONS: usize = 1024;

/// Default poll timeout
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Configuration
// ============================================================================

/// Connection manager settings.
#[derive(Debug, Clone)]
pub struct ConnMgrConfig {
    /// Inactivity limit
    pub idle_timeout: Duration,
    /// Connection table capacity
    pub max_connections: usize,
    /// Upper bound of one poll wait
    pub poll_interval: Duration,
}

impl Default for ConnMgrConfig {
    fn default() -> Self {
        Self {
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ConnMgrConfig {
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// How [`ConnectionManager::run`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerExit {
    /// The shutdown token was cancelled
    Shutdown,
    /// No connection existed for a whole idle timeout
    Timeout,
}

// ============================================================================
// Connection manager
// ============================================================================

/// Event loop serving sensor connections.
pub struct ConnectionManager {
    config: ConnMgrConfig,
    poll: Poll,
    listener: TcpListener,
    local_addr: SocketAddr,
    /// `slots[i]` is the record registered under `Token(i + 1)`.
    slots: Vec<Option<NodeRef>>,
    /// Live connections in arrival order.
    records: DpList<ConnectionRecord>,
    /// Slots that still had unread data when their read budget ran out.
    backlog: Vec<usize>,
    next_seq: u64,
    queue: Arc<ReadingQueue>,
    sink: Arc<dyn EventSink>,
    shutdown: ShutdownToken,
    stats: Arc<ConnMgrStats>,
}

impl ConnectionManager {
    /// Bind the listening socket and prepare the poller.
    pub fn bind(
        addr: SocketAddr,
        config: ConnMgrConfig,
        queue: Arc<ReadingQueue>,
        sink: Arc<dyn EventSink>,
        shutdown: ShutdownToken,
    ) -> io::Result<Self> {
        if config.max_connections == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "max_connections must be at least 1",
            ));
        }

        let poll = Poll::new()?;
        let mut listener = TcpListener::bind(addr)?;
        poll.registry()
            .register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;
        let local_addr = listener.local_addr()?;

        log::debug!(
            "[connmgr] listening on {} (capacity {}, idle timeout {:?})",
            local_addr,
            config.max_connections,
            config.idle_timeout
        );

        Ok(Self {
            slots: vec![None; config.max_connections],
            config,
            poll,
            listener,
            local_addr,
            records: DpList::new(),
            backlog: Vec::new(),
            next_seq: 0,
            queue,
            sink,
            shutdown,
            stats: Arc::new(ConnMgrStats::new()),
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Shared counters, still readable after `run` returns.
    pub fn stats(&self) -> Arc<ConnMgrStats> {
        Arc::clone(&self.stats)
    }

    /// Serve connections until shutdown or manager timeout.
    ///
    /// The listener and every remaining connection are closed before this
    /// returns.
    pub fn run(mut self) -> ManagerExit {
        let mut events = Events::with_capacity(MAX_EVENTS);
        let mut last_active = Instant::now();

        let exit = loop {
            if self.shutdown.is_cancelled() {
                break ManagerExit::Shutdown;
            }

            let timeout = if self.backlog.is_empty() {
                self.config.poll_interval
            } else {
                Duration::ZERO
            };
            if let Err(e) = self.poll.poll(&mut events, Some(timeout)) {
                if e.kind() != io::ErrorKind::Interrupted {
                    log::warn!("[connmgr] poll error: {}", e);
                }
                events.clear();
            }

            let backlog = std::mem::take(&mut self.backlog);
            for event in events.iter() {
                match event.token() {
                    LISTENER_TOKEN => self.handle_accept(),
                    token => {
                        if let Some(slot) = token.0.checked_sub(1) {
                            self.handle_readable(slot);
                        }
                    }
                }
            }
            for slot in backlog {
                self.handle_readable(slot);
            }

            let now = Instant::now();
            self.expire_idle(now);

            if !self.records.is_empty() {
                last_active = now;
            } else if now.saturating_duration_since(last_active) > self.config.idle_timeout {
                self.sink.log(&GatewayEvent::ManagerTimeout);
                break ManagerExit::Timeout;
            }
        };

        self.cleanup();
        exit
    }

    /// Accept every pending connection.
    fn handle_accept(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => self.admit(stream, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("[connmgr] accept failed: {}", e);
                    break;
                }
            }
        }
    }

    fn admit(&mut self, mut stream: TcpStream, peer: SocketAddr) {
        let slot = match self.slots.iter().position(Option::is_none) {
            Some(slot) => slot,
            None => {
                self.stats.record_rejected();
                log::warn!(
                    "[connmgr] connection table full ({} slots), dropping {}",
                    self.slots.len(),
                    peer
                );
                return;
            }
        };

        if let Err(e) = self
            .poll
            .registry()
            .register(&mut stream, Token(slot + 1), Interest::READABLE)
        {
            log::warn!("[connmgr] failed to register {}: {}", peer, e);
            return;
        }

        let record = ConnectionRecord::new(self.next_seq, slot, stream, peer, Instant::now());
        self.next_seq += 1;
        let node = self.records.insert_sorted(record);
        self.slots[slot] = Some(node);
        self.stats.record_accepted();

        log::debug!("[connmgr] accepted {} into slot {}", peer, slot);
    }

    fn handle_readable(&mut self, slot: usize) {
        let node = match self.slots.get(slot).copied().flatten() {
            Some(node) => node,
            None => return,
        };

        let mut outcome = ReadOutcome::Data;
        for _ in 0..MAX_READS_PER_EVENT {
            let record = match self.records.get_element_at_reference_mut(node) {
                Some(record) => record,
                None => return,
            };
            outcome = record.read_chunk();

            let now = Instant::now();
            while let Some(reading) = record.next_reading() {
                if record.observe(&reading, now) {
                    self.sink.log(&GatewayEvent::SensorConnected {
                        sensor_id: reading.sensor_id,
                    });
                }
                self.queue.enqueue(reading);
                self.stats.record_reading();
            }

            if outcome != ReadOutcome::Data {
                break;
            }
        }

        match outcome {
            ReadOutcome::Data => {
                if !self.backlog.contains(&slot) {
                    self.backlog.push(slot);
                }
            }
            ReadOutcome::Drained => {}
            ReadOutcome::Closed(reason) => self.close_connection(slot, reason),
        }
    }

    /// Close every connection idle for longer than the timeout.
    fn expire_idle(&mut self, now: Instant) {
        let mut expired = Vec::new();
        let mut cursor = self.records.get_first_reference();
        while let Some(node) = cursor {
            if let Some(record) = self.records.get_element_at_reference(Some(node)) {
                if now.saturating_duration_since(record.last_seen()) > self.config.idle_timeout {
                    expired.push(record.slot());
                }
            }
            cursor = self.records.get_next_reference(node);
        }

        for slot in expired {
            self.close_connection(slot, CloseReason::Timeout);
        }
    }

    fn close_connection(&mut self, slot: usize, reason: CloseReason) {
        let node = match self.slots.get_mut(slot).and_then(Option::take) {
            Some(node) => node,
            None => return,
        };
        let mut record = match self.records.remove_at_reference(Some(node)) {
            Some(record) => record,
            None => return,
        };
        self.backlog.retain(|&pending| pending != slot);

        let _ = self.poll.registry().deregister(&mut record.stream);
        if record.pending_bytes() > 0 {
            log::debug!(
                "[connmgr] discarding {} bytes of incomplete reading from {}",
                record.pending_bytes(),
                record.peer()
            );
        }

        self.sink.log(&GatewayEvent::SensorDisconnected {
            sensor_id: record.sensor_id(),
        });
        match reason {
            CloseReason::Timeout => self.stats.record_timed_out(),
            _ => self.stats.record_disconnected(),
        }
        log::info!(
            "[connmgr] sensor {} ({}) disconnected: {}",
            record.sensor_id(),
            record.peer(),
            reason
        );
    }

    fn cleanup(mut self) {
        let _ = self.poll.registry().deregister(&mut self.listener);

        let remaining = std::mem::take(&mut self.records).into_elements();
        let count = remaining.len();
        for mut record in remaining {
            let _ = self.poll.registry().deregister(&mut record.stream);
        }
        self.slots.iter_mut().for_each(|slot| *slot = None);
        self.stats.record_released(count);

        log::debug!(
            "[connmgr] stopped on {}, released {} connections",
            self.local_addr,
            count
        );
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "connmgr_tests.rs"]
mod tests;
