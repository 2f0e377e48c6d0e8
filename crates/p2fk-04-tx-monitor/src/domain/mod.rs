//! # Domain Layer - Transaction Monitor
//!
//! - `state`: lifecycle state machine
//! - `status`: status messages and summaries
//! - `naming`: local file name sanitising
//! - `outcome`: what happened to one transaction
//! - `config`, `errors`

pub mod config;
pub mod errors;
pub mod naming;
pub mod outcome;
pub mod state;
pub mod status;

pub use config::*;
pub use errors::*;
pub use naming::*;
pub use outcome::*;
pub use state::*;
pub use status::*;
