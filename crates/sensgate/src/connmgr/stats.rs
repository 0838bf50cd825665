// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection manager counters.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Live counters, updated by the manager thread and readable from anywhere.
#[derive(Debug, Default)]
pub struct ConnMgrStats {
    active: AtomicUsize,
    accepted: AtomicU64,
    rejected: AtomicU64,
    readings: AtomicU64,
    disconnected: AtomicU64,
    timed_out: AtomicU64,
}

/// Point-in-time copy of [`ConnMgrStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnMgrStatsSnapshot {
    /// Connections currently tracked
    pub active: usize,
    /// Connections admitted into the table
    pub accepted: u64,
    /// Connections dropped because the table was full
    pub rejected: u64,
    /// Readings forwarded downstream
    pub readings: u64,
    /// Connections closed by the peer or lost
    pub disconnected: u64,
    /// Connections closed for inactivity
    pub timed_out: u64,
}

impl ConnMgrStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_reading(&self) {
        self.readings.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_disconnected(&self) {
        self.disconnected.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn record_timed_out(&self) {
        self.timed_out.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Connections still open when the manager stopped.
    pub(crate) fn record_released(&self, count: usize) {
        self.active.fetch_sub(count, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ConnMgrStatsSnapshot {
        ConnMgrStatsSnapshot {
            active: self.active.load(Ordering::Relaxed),
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            readings: self.readings.load(Ordering::Relaxed),
            disconnected: self.disconnected.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
        }
    }
}
