//! # Domain Layer - Content Resolver
//!
//! - `reference`: finding content ids in message text
//! - `config`: endpoints and retry policy
//! - `errors`: download failures

pub mod config;
pub mod errors;
pub mod reference;

pub use config::*;
pub use errors::*;
pub use reference::*;
