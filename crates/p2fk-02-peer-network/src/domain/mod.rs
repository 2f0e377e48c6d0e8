//! # Domain Layer - Peer Network
//!
//! - `wire`: message framing and payloads
//! - `transaction`: transaction parsing, addresses, signer
//! - `cache`: bounded pending-transaction cache and feed cursors
//! - `state`: connection state machine
//! - `chain`: per-network constants
//! - `config`: client configuration and retry policy
//! - `errors`: wire and client errors

pub mod cache;
pub mod chain;
pub mod config;
pub mod errors;
pub mod state;
pub mod transaction;
pub mod wire;

pub use cache::*;
pub use chain::*;
pub use config::*;
pub use errors::*;
pub use state::*;
pub use transaction::{hash160, script_address, Transaction, TxIn, TxOut};
