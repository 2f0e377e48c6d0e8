//! # Shared Types Crate
//!
//! Entities passed between the P2FK crates: transaction identifiers, the
//! records produced by the monitor, blocklist entries and the events the
//! monitor publishes on the shared bus.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Every type that crosses a crate boundary is
//!   defined here.
//! - **Display Order**: `TxId` stores bytes in hash order and renders them
//!   reversed, the way block explorers and node RPCs print transaction ids.
//! - **Immutable Records**: An `IndexedItem` is built once by the monitor and
//!   never mutated afterwards.

pub mod entities;
pub mod errors;
pub mod events;

pub use entities::*;
pub use errors::*;
pub use events::*;
