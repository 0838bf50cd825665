// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # SensGate core
//!
//! Building blocks of the sensor gateway pipeline.
//!
//! ## Architecture
//!
//! ```text
//! sensor nodes --TCP--> ConnectionManager --ReadingQueue--> aggregation
//!                              |                                 |
//!                              v                                 v
//!                          EventSink <-------------------- ReadingQueue --> storage
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`DpList`] | Generic doubly-linked list with stable node references |
//! | [`HandoffQueue`] | FIFO with a bounded consumer wait |
//! | [`ConnectionManager`] | mio event loop serving sensor connections |
//! | [`Reading`] | One sensor sample and its 18-byte wire layout |
//! | [`EventSink`] | Destination of the gateway event log |
//! | [`ShutdownToken`] | Cooperative cancellation shared by all stages |

pub mod connmgr;
pub mod event;
pub mod list;
pub mod node;
pub mod reading;
pub mod sbuffer;
pub mod shutdown;
pub mod sink;

pub use connmgr::{ConnMgrConfig, ConnectionManager, ManagerExit};
pub use event::{GatewayEvent, Stage, TERMINATED_MESSAGE};
pub use list::{DpList, NodeRef};
pub use node::SensorNode;
pub use reading::{Reading, SensorId, Timestamp, RECORD_SIZE};
pub use sbuffer::{HandoffQueue, ReadingQueue};
pub use shutdown::ShutdownToken;
pub use sink::{EventSink, MemorySink};
