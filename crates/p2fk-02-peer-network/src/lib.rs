//! # Peer Network
//!
//! Joins the Bitcoin peer-to-peer network, caches announced mempool
//! transactions and serves them to the monitor.
//!
//! ## Backends
//!
//! | Backend | Type | Pending ids from |
//! |---------|------|------------------|
//! | Direct P2P | `P2pPeerNetwork` | `inv` announcements, `mempool` on connect |
//! | Full node | `RpcPeerNetwork` | `getrawmempool` polling |
//!
//! Both implement `PeerNetwork`; the composition root picks one.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Each id is fetched from peers at most once | seen-set in `PendingTxCache` |
//! | Cache bounded by a bulk trim | `PendingTxCache::insert` |
//! | One writer for peer table and cache | `service/events.rs` |
//! | Reconnect when the last peer drops | `Degraded` + supervisor wake-up |
//! | Feeds end on cancel or dispose | `feed.rs` |
//!
//! ## Module Structure
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ service/  - P2pPeerNetwork: supervisor, sessions, events │
//! │ adapters/ - framing, TcpDialer, RpcPeerNetwork           │
//! └──────────────────────────────────────────────────────────┘
//!                        ↑ implements ↑
//! ┌──────────────────────────────────────────────────────────┐
//! │ ports/    - PeerNetwork (inbound), Dialer (outbound)     │
//! └──────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌──────────────────────────────────────────────────────────┐
//! │ domain/   - wire, transaction, cache, state, config      │
//! └──────────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
mod feed;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use adapters::{RpcConfig, RpcPeerNetwork, TcpDialer};
pub use domain::*;
pub use ports::*;
pub use service::P2pPeerNetwork;
