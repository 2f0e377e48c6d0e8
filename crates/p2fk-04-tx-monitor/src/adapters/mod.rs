//! Store adapters.
//!
//! - `memory_store`: `InMemoryIndexStore`
//! - `fs_store`: `FsContentStore`

pub mod fs_store;
pub mod memory_store;

pub use fs_store::FsContentStore;
pub use memory_store::InMemoryIndexStore;
