//! # Node Container
//!
//! Configuration loading and the composition root that owns every
//! subsystem instance.
//!
//! - Subsystems are built once, in dependency order: network, resolver,
//!   stores, bus, monitor
//! - Subsystems talk through ports and the event bus, never through the node

pub mod config;
pub mod node;

pub use config::{Backend, ConfigError, NodeConfig};
pub use node::{NodeMonitor, P2fkNode};
