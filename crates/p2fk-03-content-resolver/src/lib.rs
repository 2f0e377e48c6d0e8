//! # Content Resolver
//!
//! Finds content-network references in decoded messages and downloads the
//! referenced bytes, rotating across endpoints with exponential backoff.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Marker references win over bare hashes | `ReferenceExtractor::extract` |
//! | Attempt `i` uses endpoint `i mod N` | `RetryingResolver::download` |
//! | No wait after the last attempt | `RetryingResolver::download` |
//! | Cancellation ends a download at the next await | `tokio::select!` on every wait |
//! | Empty bodies and non-2xx responses are failures | `adapters/http.rs` |
//!
//! ## Module Structure
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ service.rs - RetryingResolver (ContentResolve)     │
//! │ adapters/  - HttpGatewayFetcher, NodeApiFetcher    │
//! └────────────────────────────────────────────────────┘
//!                      ↑ implements ↑
//! ┌────────────────────────────────────────────────────┐
//! │ ports/     - ContentResolve, ContentFetcher        │
//! └────────────────────────────────────────────────────┘
//!                        ↑ uses ↑
//! ┌────────────────────────────────────────────────────┐
//! │ domain/    - references, config, errors            │
//! └────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::{HttpGatewayFetcher, NodeApiFetcher};
pub use domain::*;
pub use ports::*;
pub use service::RetryingResolver;
