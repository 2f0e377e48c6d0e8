//! Ports for the monitor.
//!
//! - `inbound`: `MonitorApi`, what the UI/service layer drives
//! - `outbound`: `IndexStore`, `ContentStore`, `MonitorMetrics`
//!
//! The peer network, decoder and content resolver ports are owned by
//! their crates and consumed as-is.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
