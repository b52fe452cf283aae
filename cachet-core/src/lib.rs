#![warn(missing_docs)]
//! Core types for the cachet request cache.
//!
//! - [`key`] derives canonical, order-independent cache keys from requests
//! - [`value`] wraps cached payloads with TTL metadata
//! - [`policy`] holds default and per-call caching policies
//! - [`context`] reports how a read was served

pub mod context;
pub mod key;
pub mod policy;
pub mod value;

pub use context::{CacheContext, CacheStatus};
pub use key::{CacheKey, KeyCodec};
pub use policy::{CacheOverride, CachePolicy, ResolvedPolicy};
pub use value::CacheEntry;
