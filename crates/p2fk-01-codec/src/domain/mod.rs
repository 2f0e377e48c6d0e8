//! # Domain Layer - P2FK Codec
//!
//! Pure functions and value types; no I/O.
//!
//! - `base58`: address payload decoder (and encoder)
//! - `carrier`: carrier allow-list and amount formatting
//! - `frames`: frame parser
//! - `encoder`: builds carrier outputs from messages and files
//! - `record`: decoded record types
//! - `errors`: address and encoder errors

pub mod base58;
pub mod carrier;
pub mod encoder;
pub mod errors;
pub mod frames;
pub mod record;

pub use base58::*;
pub use carrier::*;
pub use encoder::*;
pub use errors::*;
pub use frames::*;
pub use record::*;
