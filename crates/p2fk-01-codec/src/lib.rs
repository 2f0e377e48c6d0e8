//! # P2FK Codec
//!
//! Recovers framed records hidden in the addresses of a transaction's
//! carrier outputs.
//!
//! ## Pipeline
//!
//! 1. Keep outputs whose amount exactly matches a carrier denomination.
//! 2. Base58check-decode each address and drop its version byte.
//! 3. Concatenate the payloads in output order.
//! 4. Parse frames: `<header><frame char><length><sep><payload>`.
//! 5. Empty header ⇒ message, filename header ⇒ file stub, anything else
//!    ends decoding.
//!
//! ## Invariants
//!
//! | Invariant | Enforcement |
//! |-----------|-------------|
//! | Only carrier amounts contribute bytes | `service::collect_carrier_payload` |
//! | Malformed frames never error, they end the scan | `domain/frames.rs` |
//! | Truncated payloads yield short slices | `FrameParser::parse` |
//! | No record without a message or file stub | `FrameParser::parse` returns `None` |
//! | Decoding holds no state between calls | `P2fkCodec` is immutable |
//!
//! ## Module Structure
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │ service.rs       - P2fkCodec (RecordDecoder impl)   │
//! └─────────────────────────────────────────────────────┘
//!                       ↑ implements ↑
//! ┌─────────────────────────────────────────────────────┐
//! │ ports/inbound.rs - RecordDecoder, CarrierTransaction│
//! └─────────────────────────────────────────────────────┘
//!                         ↑ uses ↑
//! ┌─────────────────────────────────────────────────────┐
//! │ domain/          - base58, carrier, frames, encoder │
//! └─────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::*;
pub use service::{collect_carrier_payload, P2fkCodec};
