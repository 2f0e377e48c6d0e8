//! Ports for the peer network.
//!
//! - `inbound`: `PeerNetwork`, the contract the monitor consumes
//! - `outbound`: `Dialer`, how the client opens byte streams to peers

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
