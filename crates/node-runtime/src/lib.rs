//! # Node Runtime Library
//!
//! Exposes the node's configuration and composition root for testing.
//! The entry point is the `p2fk-node` binary in `main.rs`.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging from `P2FK_*` telemetry variables
//! 2. Load `NodeConfig` (TOML file, then environment overrides)
//! 3. Build the peer network backend and the monitor's collaborators
//! 4. Apply the configured blocklist, spawn the event log and gauges
//! 5. Start the monitor, retrying while no peer is reachable
//! 6. Run until Ctrl+C, then stop the monitor and dispose the network

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod container;

pub use container::{Backend, ConfigError, NodeConfig, NodeMonitor, P2fkNode};
