// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Event sinks.
//!
//! Stages never write log files themselves; they hand [`GatewayEvent`]s to an
//! [`EventSink`] shared by all threads.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::event::GatewayEvent;

/// Maximum length of one log line, newline included.
pub const LOG_LINE_MAX: usize = 1024;

/// Destination for gateway events.
///
/// Implementations are shared between stage threads and must accept
/// concurrent calls. A failure to record an event is never fatal to the
/// caller, so `log` does not return an error.
pub trait EventSink: Send + Sync {
    /// Record one event.
    fn log(&self, event: &GatewayEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn log(&self, event: &GatewayEvent) {
        (**self).log(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn log(&self, event: &GatewayEvent) {
        (**self).log(event)
    }
}

/// Render `event` as one newline-terminated line of at most [`LOG_LINE_MAX`]
/// bytes. Longer text is cut on a character boundary.
pub fn render_line(event: &GatewayEvent) -> String {
    let mut line = event.to_string();
    if line.len() > LOG_LINE_MAX - 1 {
        let mut cut = LOG_LINE_MAX - 1;
        while !line.is_char_boundary(cut) {
            cut -= 1;
        }
        line.truncate(cut);
    }
    line.push('\n');
    line
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<GatewayEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded events, oldest first.
    pub fn events(&self) -> Vec<GatewayEvent> {
        self.events.lock().clone()
    }

    /// Recorded events rendered as log lines (without newline).
    pub fn lines(&self) -> Vec<String> {
        self.events.lock().iter().map(|e| e.to_string()).collect()
    }

    /// True if an event rendering to `line` was recorded.
    pub fn contains(&self, line: &str) -> bool {
        self.events.lock().iter().any(|e| e.to_string() == line)
    }
}

impl EventSink for MemorySink {
    fn log(&self, event: &GatewayEvent) {
        self.events.lock().push(event.clone());
    }
}
