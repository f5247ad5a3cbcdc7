use crate::config::{create_hasher, normalize_shard_count, Config, RoutingConfig};
use crate::error::Error;
use crate::hash::ShardHasher;
use crate::iter::{self, OutputBuffer, Snapshot};
use crate::shard::Shard;
use crate::stats::{ShardOps, Stats};
use std::collections::HashMap;
use std::sync::Arc;

/// Concurrent map from strings to values, split across independently locked shards.
///
/// Every keyed operation hashes the key once, picks exactly one shard and
/// holds only that shard's lock for the duration of the call (shared for
/// reads, exclusive for writes). Operations on different shards never block
/// each other. Values are wrapped in `Arc<V>` so you can share them without
/// copying.
///
/// Only single-key operations are atomic. Aggregate operations (`count`,
/// `keys`, `items`, iteration) visit shards one lock at a time and are not a
/// point-in-time view of the whole map under concurrent writers.
///
/// # Example
///
/// ```rust
/// use strshard::ShardedMap;
///
/// let map = ShardedMap::new(4);
/// map.set("a", 1);
/// map.set("b", 2);
///
/// assert_eq!(map.count(), 2);
/// assert_eq!(map.get("b").as_deref(), Some(&2));
/// assert_eq!(map.pop("b").as_deref(), Some(&2));
/// assert!(!map.has("b"));
/// ```
pub struct ShardedMap<V> {
    shards: Arc<[Shard<V>]>,
    hash: ShardHasher,
    routing: RoutingConfig,
}

impl<V> ShardedMap<V>
where
    V: Send + Sync,
{
    /// Create a new map with `shard_count` shards and FNV routing.
    ///
    /// A `shard_count` of zero selects the default of 32. The count never
    /// changes afterwards, so a key always routes to the same shard.
    pub fn new(shard_count: usize) -> Self {
        Self::with_config(Config::new().shard_count(shard_count))
    }

    /// Create a new map with custom config.
    pub fn with_config(config: Config) -> Self {
        let shard_count = normalize_shard_count(config.shard_count);
        let shards: Vec<Shard<V>> = (0..shard_count)
            .map(|_| Shard::new(config.capacity_per_shard))
            .collect();

        Self {
            shards: shards.into(),
            hash: create_hasher(config.hash_function),
            routing: config.routing,
        }
    }

    /// Number of shards, fixed at construction.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Figure out which shard this key belongs to.
    ///
    /// With the default config this is `fnv32(key) % shard_count`, a pure
    /// function of the key bytes and the shard count.
    #[inline]
    pub fn shard_index(&self, key: &str) -> usize {
        let hash = self.hash.hash_key(key);
        self.routing.route(hash, self.shards.len())
    }

    #[inline]
    fn shard(&self, key: &str) -> &Shard<V> {
        &self.shards[self.shard_index(key)]
    }

    /// Insert or overwrite the value stored under `key`.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        self.shard(&key).set(key, Arc::new(value));
    }

    /// Set every pair from `batch`.
    ///
    /// Each key is updated atomically on its own; the batch as a whole is not
    /// atomic and other threads may observe it partially applied.
    pub fn mset<I, K>(&self, batch: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
    {
        for (key, value) in batch {
            self.set(key, value);
        }
    }

    /// Insert `value` only if `key` is absent.
    ///
    /// Returns `true` if the value was inserted and `false` if the key already
    /// existed, in which case the map is left untouched.
    ///
    /// ```rust
    /// use strshard::ShardedMap;
    ///
    /// let map = ShardedMap::default();
    /// assert!(map.set_if_absent("k", 1));
    /// assert!(!map.set_if_absent("k", 2));
    /// assert_eq!(*map.get("k").unwrap(), 1);
    /// ```
    pub fn set_if_absent(&self, key: impl Into<String>, value: V) -> bool {
        let key = key.into();
        self.shard(&key).set_if_absent(key, value)
    }

    /// Get a value by key. Returns an `Arc<V>` so you can share it without copying.
    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        self.shard(key).get(key)
    }

    /// Whether `key` is present.
    pub fn has(&self, key: &str) -> bool {
        self.shard(key).contains_key(key)
    }

    /// Remove `key` if present. Removing an absent key is a no-op.
    pub fn remove(&self, key: &str) {
        self.shard(key).remove(key);
    }

    /// Remove `key` and return its value in a single lock acquisition.
    ///
    /// Unlike `get` followed by `remove`, no other writer can slip in between.
    pub fn pop(&self, key: &str) -> Option<Arc<V>> {
        self.shard(key).remove(key)
    }

    /// Insert or update `key` through `combine`, returning the stored value.
    ///
    /// `combine` receives the current value (if any) and `value`, and its
    /// result is stored under `key`. The whole read-modify-write happens
    /// under the shard's exclusive lock.
    ///
    /// # Deadlocks
    ///
    /// `combine` runs while the shard's exclusive lock is held and the lock is
    /// not re-entrant. It must not call back into this map, not even for a
    /// different key, since that key may live in the same shard. Doing so
    /// deadlocks in release builds and panics in debug builds.
    ///
    /// ```rust
    /// use strshard::ShardedMap;
    ///
    /// let map = ShardedMap::default();
    /// let add = |old: Option<&u64>, new: u64| old.copied().unwrap_or(0) + new;
    /// map.upsert("hits", 1, add);
    /// assert_eq!(*map.upsert("hits", 2, add), 3);
    /// ```
    pub fn upsert<F>(&self, key: impl Into<String>, value: V, combine: F) -> Arc<V>
    where
        F: FnOnce(Option<&V>, V) -> V,
    {
        let key = key.into();
        self.shard(&key).upsert(key, value, combine)
    }

    /// Get the total number of entries across all shards.
    ///
    /// Each shard's length is read under its own lock in turn, so under
    /// concurrent writers this is a sum of per-shard counts rather than a
    /// point-in-time total.
    pub fn count(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Every key in the map, in no particular order.
    ///
    /// Shards are read concurrently by scoped worker threads, one per shard, so
    /// the thread count of each call grows linearly with the shard count. Fails
    /// only if a worker thread cannot be spawned.
    pub fn keys(&self) -> Result<Vec<String>, Error> {
        iter::collect_keys(&self.shards, self.count())
    }

    /// Copy every entry into a plain `HashMap`.
    ///
    /// Each shard is copied under its read lock, then released before the
    /// next one is visited.
    pub fn items(&self) -> HashMap<String, Arc<V>> {
        let mut items = HashMap::with_capacity(self.count());
        for shard in self.shards.iter() {
            items.extend(shard.entries());
        }
        items
    }

    /// Call `f` once per entry, visiting shards one at a time in shard order.
    ///
    /// A shard's read lock is held while its entries are visited, so `f` sees
    /// a consistent view of each shard but not across shards. This is the
    /// cheapest way to read every entry.
    ///
    /// `f` runs under the read lock and must not call back into this map; see
    /// [`upsert`](Self::upsert) for the same restriction.
    pub fn iter_cb<F>(&self, mut f: F)
    where
        F: FnMut(&str, &V),
    {
        for shard in self.shards.iter() {
            shard.for_each(&mut f);
        }
    }

    /// Get detailed statistics about the map and its shards.
    pub fn stats(&self) -> Stats {
        let shard_sizes: Vec<usize> = self.shards.iter().map(|s| s.len()).collect();
        let operations: Vec<ShardOps> = self.shards.iter().map(|s| s.stats()).collect();
        let size: usize = shard_sizes.iter().sum();

        Stats {
            size,
            shard_sizes,
            operations,
        }
    }
}

impl<V> ShardedMap<V>
where
    V: Send + Sync + 'static,
{
    /// Snapshot every shard and return a lazy iterator over all entries.
    ///
    /// Blocks until every shard has been sized under its read lock; copying
    /// the entries out then continues on background threads. The merged
    /// output is buffered to the total size, so the workers finish even if
    /// the iterator is never read. Each shard is a consistent capture, the
    /// map as a whole is not.
    ///
    /// Each call spawns one OS thread per shard plus one fan-in thread, so
    /// thread count grows linearly with the shard count.
    ///
    /// ```rust
    /// use strshard::ShardedMap;
    ///
    /// let map = ShardedMap::new(8);
    /// map.mset([("a", 1), ("b", 2), ("c", 3)]);
    ///
    /// let sum: i32 = map.iter_buffered()?.map(|(_, v)| *v).sum();
    /// assert_eq!(sum, 6);
    /// # Ok::<(), strshard::Error>(())
    /// ```
    pub fn iter_buffered(&self) -> Result<Snapshot<V>, Error> {
        iter::traverse(&self.shards, OutputBuffer::Exact)
    }

    /// Like [`iter_buffered`](Self::iter_buffered), but the merged output is
    /// unbuffered: entries are handed over one at a time as they are read.
    ///
    /// Dropping the iterator early stops the background workers. Spawns the
    /// same `shard_count + 1` threads as `iter_buffered`.
    pub fn iter(&self) -> Result<Snapshot<V>, Error> {
        iter::traverse(&self.shards, OutputBuffer::Rendezvous)
    }
}

impl<V> Default for ShardedMap<V>
where
    V: Send + Sync,
{
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl<V> std::fmt::Debug for ShardedMap<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedMap")
            .field("shard_count", &self.shards.len())
            .field("hash", &self.hash)
            .field("routing", &self.routing)
            .finish()
    }
}
