//! # P2FK Test Suite
//!
//! Cross-crate tests that wire real crates together.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/
//! │   ├── harness.rs        # Scripted P2P network feeding a fully wired monitor
//! │   └── integration/
//! │       ├── scenarios.rs  # End-to-end flows: message, file stub, content, reconnect
//! │       └── properties.rs # proptest properties over codec, cache and monitor
//! └── benches/
//!     └── codec_benchmarks.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p p2fk-tests
//! cargo test -p p2fk-tests integration::scenarios::
//! cargo bench -p p2fk-tests
//! ```

#![allow(clippy::unwrap_used, clippy::expect_used)]

pub mod harness;
pub mod integration;
