// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Handoff queue between two pipeline stages.
//!
//! A FIFO guarded by one mutex and a not-empty condition. Producers never
//! block; consumers wait for data up to a fixed deadline and treat silence as
//! the end of the stream.
//!
//! ```
//! use sensgate::sbuffer::HandoffQueue;
//! use std::time::Duration;
//!
//! let queue = HandoffQueue::new(Duration::from_millis(20));
//! queue.enqueue(1u8);
//! assert_eq!(queue.dequeue(), Some(1));
//! assert_eq!(queue.dequeue(), None); // nothing arrived within 20ms
//! ```

use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::reading::Reading;

/// Queue carrying sensor readings between stages.
pub type ReadingQueue = HandoffQueue<Reading>;

/// Blocking FIFO with a bounded consumer wait.
#[derive(Debug)]
pub struct HandoffQueue<T> {
    items: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    /// How long `dequeue` waits for an item before giving up.
    wait: Duration,
}

impl<T> HandoffQueue<T> {
    /// Create an empty queue whose consumers wait at most `wait`.
    pub fn new(wait: Duration) -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            not_empty: Condvar::new(),
            wait,
        }
    }

    /// Queue sized for a pipeline whose connections idle out after `idle`.
    ///
    /// Consumers wait twice the idle timeout.
    pub fn for_idle_timeout(idle: Duration) -> Self {
        Self::new(idle.saturating_mul(2))
    }

    /// Append `item` at the tail and wake one waiting consumer.
    pub fn enqueue(&self, item: T) {
        let mut items = self.items.lock();
        items.push_back(item);
        self.not_empty.notify_one();
    }

    /// Take the head item, waiting up to the configured deadline.
    ///
    /// Returns `None` when nothing arrived in time.
    pub fn dequeue(&self) -> Option<T> {
        let deadline = Instant::now() + self.wait;
        let mut items = self.items.lock();
        while items.is_empty() {
            if self.not_empty.wait_until(&mut items, deadline).timed_out() {
                break;
            }
        }
        items.pop_front()
    }

    /// Take the head item without waiting.
    pub fn try_dequeue(&self) -> Option<T> {
        self.items.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Configured consumer deadline.
    pub fn wait_timeout(&self) -> Duration {
        self.wait
    }
}
