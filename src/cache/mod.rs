//! On-disk caching of lookup-service responses with TTL expiry.

pub mod disk_cache;

pub use disk_cache::{CacheStats, DiskCache};
