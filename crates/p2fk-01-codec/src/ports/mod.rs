//! Ports for the codec.

pub mod inbound;

pub use inbound::*;
