//! Cache Module
//!
//! Provides a disk-persisted key/value cache with TTL expiration and
//! oldest-first eviction.

mod entry;
mod order;
mod stats;
mod store;


// Re-export public types
pub use entry::{current_timestamp, CacheEntry};
pub use order::KeyOrder;
pub use stats::{CacheStats, LoadReport};
pub use store::FileCache;

// == Public Constants ==
/// Default maximum number of entries kept in a cache document
pub const DEFAULT_MAX_ENTRIES: usize = 500;

/// File name of the cache document inside the cache directory
pub const CACHE_FILE_NAME: &str = "cache.json";
