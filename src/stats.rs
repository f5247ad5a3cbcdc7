//! Statistics and diagnostics types.

#[cfg(feature = "metrics")]
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-shard operation statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardOps {
    /// Number of read operations on this shard.
    pub reads: u64,
    /// Number of write operations on this shard.
    pub writes: u64,
    /// Number of remove operations on this shard.
    pub removes: u64,
    /// Number of lock acquisitions (0 when metrics feature disabled).
    pub lock_acquisitions: u64,
    /// Cumulative lock wait time in nanoseconds (0 when lock-timing disabled).
    pub lock_wait_nanos: u64,
}

impl ShardOps {
    /// Reads, writes and removes combined.
    pub fn total(&self) -> u64 {
        self.reads + self.writes + self.removes
    }
}

/// A relaxed event counter. Without the `metrics` feature it has no storage
/// and always reads as zero.
#[derive(Default)]
struct Counter(#[cfg(feature = "metrics")] AtomicU64);

#[cfg(feature = "metrics")]
impl Counter {
    #[inline]
    fn add(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(not(feature = "metrics"))]
impl Counter {
    #[inline]
    fn add(&self, _n: u64) {}

    fn get(&self) -> u64 {
        0
    }
}

/// Operation counters for one shard, bumped by the shard's own methods.
#[derive(Default)]
pub(crate) struct ShardStats {
    reads: Counter,
    writes: Counter,
    removes: Counter,
    lock_acquisitions: Counter,
    lock_wait_nanos: Counter,
}

impl ShardStats {
    #[inline]
    pub fn record_read(&self) {
        self.reads.add(1);
    }

    #[inline]
    pub fn record_write(&self) {
        self.writes.add(1);
    }

    #[inline]
    pub fn record_remove(&self) {
        self.removes.add(1);
    }

    /// Run `acquire`, counting it as one lock acquisition and, with
    /// `lock-timing`, adding the time it blocked to the wait total.
    #[inline]
    pub fn acquire<G>(&self, acquire: impl FnOnce() -> G) -> G {
        self.lock_acquisitions.add(1);
        #[cfg(feature = "lock-timing")]
        let start = std::time::Instant::now();
        let guard = acquire();
        #[cfg(feature = "lock-timing")]
        self.lock_wait_nanos
            .add(u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX));
        guard
    }

    pub fn snapshot(&self) -> ShardOps {
        ShardOps {
            reads: self.reads.get(),
            writes: self.writes.get(),
            removes: self.removes.get(),
            lock_acquisitions: self.lock_acquisitions.get(),
            lock_wait_nanos: self.lock_wait_nanos.get(),
        }
    }
}

/// Aggregate statistics for a ShardedMap instance.
///
/// Each shard is read under its own lock in turn, so under concurrent writers
/// `size` is a sum of per-shard counts rather than a point-in-time total.
#[derive(Debug, Clone)]
pub struct Stats {
    /// Total number of entries across all shards.
    pub size: usize,
    /// Number of entries in each shard, in shard order.
    pub shard_sizes: Vec<usize>,
    /// Operation counts for each shard.
    pub operations: Vec<ShardOps>,
}

impl Stats {
    /// Largest shard size divided by the mean shard size (0.0 for an empty map).
    pub fn max_load_ratio(&self) -> f64 {
        if self.size == 0 || self.shard_sizes.is_empty() {
            return 0.0;
        }
        let avg = self.size as f64 / self.shard_sizes.len() as f64;
        let max = self.shard_sizes.iter().copied().max().unwrap_or(0);
        max as f64 / avg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_load_ratio() {
        let stats = Stats {
            size: 4,
            shard_sizes: vec![1, 3],
            operations: vec![ShardOps::default(); 2],
        };
        assert_eq!(stats.max_load_ratio(), 1.5);
    }

    #[test]
    fn test_max_load_ratio_empty() {
        let stats = Stats {
            size: 0,
            shard_sizes: vec![0; 4],
            operations: vec![ShardOps::default(); 4],
        };
        assert_eq!(stats.max_load_ratio(), 0.0);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_counters_accumulate() {
        let stats = ShardStats::default();
        stats.record_read();
        stats.record_write();
        stats.record_write();
        stats.record_remove();
        let ops = stats.snapshot();
        assert_eq!((ops.reads, ops.writes, ops.removes), (1, 2, 1));
        assert_eq!(ops.total(), 4);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_acquire_counts_and_passes_the_guard_through() {
        let stats = ShardStats::default();
        let lock = parking_lot::RwLock::new(7);
        assert_eq!(*stats.acquire(|| lock.read()), 7);
        *stats.acquire(|| lock.write()) += 1;
        assert_eq!(*lock.read(), 8);
        assert_eq!(stats.snapshot().lock_acquisitions, 2);
    }

    #[cfg(not(feature = "metrics"))]
    #[test]
    fn test_counters_are_free_without_metrics() {
        assert_eq!(std::mem::size_of::<ShardStats>(), 0);
        let stats = ShardStats::default();
        stats.record_read();
        assert_eq!(stats.acquire(|| 5), 5);
        assert_eq!(stats.snapshot(), ShardOps::default());
    }
}
