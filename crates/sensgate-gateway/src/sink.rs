// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use sensgate::{EventSink, GatewayEvent};

/// Mirrors gateway events into `tracing`, for runs without a log process.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn log(&self, event: &GatewayEvent) {
        match event {
            GatewayEvent::InvalidSensor { .. }
            | GatewayEvent::TooHot { .. }
            | GatewayEvent::TooCold { .. }
            | GatewayEvent::StorageUnavailable { .. }
            | GatewayEvent::StorageRetry { .. } => {
                tracing::warn!(target: "sensgate::event", "{}", event)
            }
            _ => tracing::info!(target: "sensgate::event", "{}", event),
        }
    }
}
