use crate::stats::ShardStats;
use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

#[cfg(debug_assertions)]
use parking_lot::Mutex;
#[cfg(debug_assertions)]
use std::thread::{self, ThreadId};

pub(crate) type Table<V> = HashMap<String, Arc<V>>;

/// A single shard containing a HashMap protected by a read-write lock.
pub(crate) struct Shard<V> {
    map: RwLock<Table<V>>,
    stats: ShardStats,
    /// Threads currently running a caller callback under this shard's lock.
    #[cfg(debug_assertions)]
    in_callback: Mutex<Vec<ThreadId>>,
}

/// Marks the current thread as running a caller callback under a shard lock.
struct CallbackScope<'a, V> {
    #[cfg_attr(not(debug_assertions), allow(dead_code))]
    shard: &'a Shard<V>,
}

impl<V> Drop for CallbackScope<'_, V> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let me = thread::current().id();
            let mut holders = self.shard.in_callback.lock();
            if let Some(pos) = holders.iter().position(|id| *id == me) {
                holders.swap_remove(pos);
            }
        }
    }
}

impl<V> Shard<V> {
    pub fn new(capacity: Option<usize>) -> Self {
        let map = match capacity {
            Some(capacity) => HashMap::with_capacity(capacity),
            None => HashMap::new(),
        };
        Self {
            map: RwLock::new(map),
            stats: ShardStats::default(),
            #[cfg(debug_assertions)]
            in_callback: Mutex::new(Vec::new()),
        }
    }

    /// Panics if the calling thread is inside a callback holding this shard.
    ///
    /// The lock is not re-entrant, so the request would otherwise hang.
    #[cfg(debug_assertions)]
    pub(crate) fn check_reentrancy(&self) {
        let me = thread::current().id();
        if self.in_callback.lock().contains(&me) {
            panic!(
                "re-entrant access to a shard from inside its own upsert/iter_cb callback; \
                 this would deadlock"
            );
        }
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    pub(crate) fn check_reentrancy(&self) {}

    fn enter_callback(&self) -> CallbackScope<'_, V> {
        #[cfg(debug_assertions)]
        self.in_callback.lock().push(thread::current().id());
        CallbackScope { shard: self }
    }

    /// Acquire the shared lock.
    pub fn read(&self) -> RwLockReadGuard<'_, Table<V>> {
        self.check_reentrancy();
        self.stats.acquire(|| self.map.read())
    }

    /// Acquire the exclusive lock.
    fn write(&self) -> RwLockWriteGuard<'_, Table<V>> {
        self.check_reentrancy();
        self.stats.acquire(|| self.map.write())
    }

    /// Insert or overwrite, returning the previous value if any.
    pub fn set(&self, key: String, value: Arc<V>) -> Option<Arc<V>> {
        let previous = self.write().insert(key, value);
        self.stats.record_write();
        previous
    }

    /// Insert only when the key is absent. Returns whether the insert happened.
    pub fn set_if_absent(&self, key: String, value: V) -> bool {
        let mut map = self.write();
        match map.entry(key) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::new(value));
                self.stats.record_write();
                true
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<V>> {
        let result = self.read().get(key).cloned();
        self.stats.record_read();
        result
    }

    pub fn contains_key(&self, key: &str) -> bool {
        let found = self.read().contains_key(key);
        self.stats.record_read();
        found
    }

    /// Remove a key under one lock acquisition, returning its value if it existed.
    pub fn remove(&self, key: &str) -> Option<Arc<V>> {
        let result = self.write().remove(key);
        if result.is_some() {
            self.stats.record_remove();
        }
        result
    }

    /// Read-modify-write under the exclusive lock.
    ///
    /// `combine` runs while the lock is held and must not touch this shard.
    pub fn upsert<F>(&self, key: String, value: V, combine: F) -> Arc<V>
    where
        F: FnOnce(Option<&V>, V) -> V,
    {
        let mut map = self.write();
        let result = match map.entry(key) {
            Entry::Occupied(mut occupied) => {
                let combined = {
                    let _scope = self.enter_callback();
                    Arc::new(combine(Some(occupied.get().as_ref()), value))
                };
                occupied.insert(Arc::clone(&combined));
                combined
            }
            Entry::Vacant(vacant) => {
                let combined = {
                    let _scope = self.enter_callback();
                    Arc::new(combine(None, value))
                };
                vacant.insert(Arc::clone(&combined));
                combined
            }
        };
        self.stats.record_write();
        result
    }

    /// Visit every entry while holding the shared lock.
    pub fn for_each<F>(&self, f: &mut F)
    where
        F: FnMut(&str, &V),
    {
        let map = self.read();
        let _scope = self.enter_callback();
        for (key, value) in map.iter() {
            f(key, value);
        }
    }

    /// Clone out every entry under one shared lock acquisition.
    pub fn entries(&self) -> Vec<(String, Arc<V>)> {
        self.read()
            .iter()
            .map(|(key, value)| (key.clone(), Arc::clone(value)))
            .collect()
    }

    /// Get the number of entries in this shard.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Get a snapshot of statistics for this shard.
    pub fn stats(&self) -> crate::stats::ShardOps {
        self.stats.snapshot()
    }
}
