//! # strshard
//!
//! A concurrent map from strings to values, sharded to keep lock contention
//! low under mixed read/write workloads.
//!
//! Keys are routed to one of a fixed number of shards by a 32-bit FNV hash,
//! and every shard has its own read-write lock. Operations on different shards
//! don't block each other. Values are stored behind `Arc<V>` so reads hand out
//! shared handles without copying.
//!
//! ## Guarantees
//!
//! - **Single-key atomicity**: `set`, `set_if_absent`, `pop` and `upsert` each
//!   run under one exclusive shard lock.
//! - **Stable routing**: the shard count is fixed at construction and the
//!   default hash is a pure function of the key bytes.
//! - **Per-shard consistency only**: `count`, `keys`, `items`, `iter_cb` and
//!   the snapshot iterators see each shard consistently, never the whole map
//!   at one instant.
//!
//! ## Example
//!
//! ```rust
//! use strshard::ShardedMap;
//!
//! let map = ShardedMap::new(4);
//!
//! map.set("a", 1);
//! map.set("b", 2);
//! map.set("c", 3);
//! assert_eq!(map.count(), 3);
//!
//! assert_eq!(map.get("b").as_deref(), Some(&2));
//! assert_eq!(map.pop("b").as_deref(), Some(&2));
//! assert_eq!(map.count(), 2);
//!
//! // Read-modify-write under the shard lock.
//! map.upsert("a", 10, |old, new| old.copied().unwrap_or(0) + new);
//! assert_eq!(*map.get("a").unwrap(), 11);
//!
//! for (key, value) in map.iter_buffered()? {
//!     println!("{key}: {value}");
//! }
//! # Ok::<(), strshard::Error>(())
//! ```
//!
//! ## Callbacks and deadlocks
//!
//! The combiner passed to [`ShardedMap::upsert`] and the callback passed to
//! [`ShardedMap::iter_cb`] run while a shard lock is held. Shard locks are not
//! re-entrant, so these callbacks must never call back into the same map.
//! Debug builds detect this and panic; release builds hang.
//!
//! ## Configuration
//!
//! ```rust
//! use strshard::{HashFunction, ShardedMapBuilder};
//!
//! let map = ShardedMapBuilder::new()
//!     .shard_count(64)
//!     .hash_function(HashFunction::Fnv32)
//!     .capacity_per_shard(128)
//!     .build::<String>();
//! assert_eq!(map.shard_count(), 64);
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

/// Configuration and builder types.
pub mod config;
/// Serialization of the whole map as a flat key/value mapping.
pub mod encode;
/// Error types.
pub mod error;
/// Hash function implementations.
pub mod hash;
/// Snapshot and fan-in iteration.
pub mod iter;
/// Single-lock map.
pub mod locked;
/// Internal shard implementation.
mod shard;
/// Main ShardedMap implementation.
pub mod sharded_map;
/// Statistics and metrics collection.
pub mod stats;

// Re-export main types
pub use config::{
    Config, HashFunction, ModuloRouter, RoutingConfig, ShardRouter, ShardedMapBuilder,
    DEFAULT_SHARD_COUNT,
};
pub use error::Error;
pub use iter::{Snapshot, Tuple};
pub use locked::LockedMap;
pub use sharded_map::ShardedMap;
pub use stats::{ShardOps, Stats};
