//! Storage trait and in-memory store for the cachet request cache.
//!
//! Implement [`Backend`] to plug in your own store; [`MemoryBackend`] is the
//! default, process-local one.
mod backend;
mod error;
mod memory;

pub use backend::{Backend, BackendResult, CacheBackend, CacheStats, ClearScope, EntryInfo};
pub use error::BackendError;
pub use memory::MemoryBackend;
