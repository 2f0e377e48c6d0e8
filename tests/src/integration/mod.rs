//! Cross-crate integration tests.

pub mod properties;
pub mod scenarios;
