//! # Transaction Monitor
//!
//! Consumes the peer network's new-transaction feed, decodes P2FK records,
//! resolves content references and persists one indexed item per message
//! or file stub.
//!
//! ## Pipeline
//!
//! 1. Look the id up on the peer network.
//! 2. Decode; transactions without a record are skipped silently.
//! 3. Skip records whose signer is on the blocklist.
//! 4. Messages: download referenced content, else keep the text.
//! 5. File stubs: keep name and declared size.
//! 6. Publish an item-indexed event per persisted item.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | One failing transaction never ends the loop | `MonitorCore::run` logs and continues |
//! | Blocked signers leave no trace | blocklist checked before any item is built |
//! | A failed download persists nothing for that message | `message_item` returns an error |
//! | Downloaded files never escape the data directory | `sanitize_file_name` |
//! | `start()` while active and repeated `stop()` are no-ops | `Control` state under one lock |
//!
//! ## Module Structure
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │ service/  - TransactionMonitor (MonitorApi), pipeline     │
//! │ adapters/ - InMemoryIndexStore, FsContentStore            │
//! └───────────────────────────────────────────────────────────┘
//!                        ↑ implements ↑
//! ┌───────────────────────────────────────────────────────────┐
//! │ ports/    - MonitorApi, IndexStore, ContentStore, metrics │
//! └───────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌───────────────────────────────────────────────────────────┐
//! │ domain/   - state, status, naming, outcome, config        │
//! └───────────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use adapters::{FsContentStore, InMemoryIndexStore};
pub use domain::*;
pub use ports::*;
pub use service::TransactionMonitor;
