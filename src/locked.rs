//! A plain map behind one mutex.
//!
//! Useful as a baseline next to [`ShardedMap`](crate::ShardedMap) or for small
//! stores where partitioning is not worth it. Every operation takes the same
//! exclusive lock. Construct one explicitly and share it by handle.

use hashbrown::HashMap;
use parking_lot::Mutex;

/// Capacity hint used by [`LockedMap::new`].
pub const DEFAULT_CAPACITY: usize = 100;

/// Unsharded string-keyed map guarded by a single exclusive lock.
///
/// ```rust
/// use strshard::LockedMap;
///
/// let map = LockedMap::new();
/// map.store("answer", -1);
/// // A stored -1 is still distinguishable from absence.
/// assert_eq!(map.lookup("answer"), Some(-1));
/// assert_eq!(map.lookup("missing"), None);
/// ```
#[derive(Debug)]
pub struct LockedMap<V> {
    inner: Mutex<HashMap<String, V>>,
}

impl<V> LockedMap<V> {
    /// Create an empty map with room for [`DEFAULT_CAPACITY`] entries.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty map with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(HashMap::with_capacity(capacity)),
        }
    }

    /// Insert or overwrite.
    pub fn store(&self, key: impl Into<String>, value: V) {
        self.inner.lock().insert(key.into(), value);
    }

    /// Clone out the value under `key`, if any.
    pub fn lookup(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Remove `key`; a no-op when absent.
    pub fn delete(&self, key: &str) {
        self.inner.lock().remove(key);
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

impl<V> Default for LockedMap<V> {
    fn default() -> Self {
        Self::new()
    }
}
