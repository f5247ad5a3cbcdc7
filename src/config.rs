use crate::hash::ShardHasher;

/// Shard count used when the requested count is zero.
pub const DEFAULT_SHARD_COUNT: usize = 32;

/// Which hash function to use for shard assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashFunction {
    /// 32-bit FNV (default). Routing is stable across runs and platforms.
    #[default]
    Fnv32,
    /// Use ahash with fixed keys (fast, not stable across crate versions).
    AHash,
    /// Use fxhash (faster but potentially less distributed).
    #[cfg(feature = "fxhash")]
    FxHash,
}

/// User-provided shard selection. Enables stateful or custom routing.
pub trait ShardRouter: Send + Sync {
    /// Return the shard index for the given key hash.
    ///
    /// Results outside `[0, shard_count)` are reduced modulo `shard_count`.
    fn route(&self, key_hash: u64, shard_count: usize) -> usize;
}

/// Default routing: `hash % shard_count`, unsigned throughout.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuloRouter;

impl ShardRouter for ModuloRouter {
    #[inline]
    fn route(&self, key_hash: u64, shard_count: usize) -> usize {
        (key_hash % shard_count as u64) as usize
    }
}

/// Routing strategy for shard selection.
#[derive(Default)]
pub enum RoutingConfig {
    /// Default: hash % shard_count.
    #[default]
    Default,
    /// User-provided router (e.g. stateful or custom distribution).
    Custom(Box<dyn ShardRouter>),
}

impl RoutingConfig {
    #[inline]
    pub(crate) fn route(&self, key_hash: u64, shard_count: usize) -> usize {
        match self {
            RoutingConfig::Default => ModuloRouter.route(key_hash, shard_count),
            RoutingConfig::Custom(router) => router.route(key_hash, shard_count) % shard_count,
        }
    }
}

impl std::fmt::Debug for RoutingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoutingConfig::Default => write!(f, "RoutingConfig::Default"),
            RoutingConfig::Custom(_) => write!(f, "RoutingConfig::Custom(...)"),
        }
    }
}

/// Configuration for a ShardedMap instance.
#[derive(Debug)]
pub struct Config {
    pub(crate) shard_count: usize,
    pub(crate) hash_function: HashFunction,
    pub(crate) capacity_per_shard: Option<usize>,
    pub(crate) routing: RoutingConfig,
}

impl Config {
    /// Create a new config with defaults (32 shards, FNV).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of shards. Zero selects [`DEFAULT_SHARD_COUNT`].
    pub fn shard_count(mut self, count: usize) -> Self {
        self.shard_count = normalize_shard_count(count);
        self
    }

    /// Set the hash function to use.
    pub fn hash_function(mut self, hash_fn: HashFunction) -> Self {
        self.hash_function = hash_fn;
        self
    }

    /// Set initial capacity per shard. Total capacity will be approximately
    /// `capacity_per_shard * shard_count`. Omitted by default (HashMap default).
    pub fn capacity_per_shard(mut self, capacity: usize) -> Self {
        self.capacity_per_shard = Some(capacity);
        self
    }

    /// Use a custom shard router.
    pub fn routing(mut self, routing: RoutingConfig) -> Self {
        self.routing = routing;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            hash_function: HashFunction::Fnv32,
            capacity_per_shard: None,
            routing: RoutingConfig::Default,
        }
    }
}

/// Builder for creating a ShardedMap with custom configuration.
///
/// ```rust
/// use strshard::{HashFunction, ShardedMapBuilder};
///
/// let map = ShardedMapBuilder::new()
///     .shard_count(8)
///     .hash_function(HashFunction::AHash)
///     .capacity_per_shard(64)
///     .build::<u32>();
/// assert_eq!(map.shard_count(), 8);
/// ```
#[derive(Debug, Default)]
pub struct ShardedMapBuilder {
    config: Config,
}

impl ShardedMapBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of shards. Zero selects [`DEFAULT_SHARD_COUNT`].
    pub fn shard_count(mut self, count: usize) -> Self {
        self.config = self.config.shard_count(count);
        self
    }

    /// Set the hash function to use.
    pub fn hash_function(mut self, hash_fn: HashFunction) -> Self {
        self.config = self.config.hash_function(hash_fn);
        self
    }

    /// Set initial capacity per shard. Total capacity ≈ `capacity_per_shard * shard_count`.
    pub fn capacity_per_shard(mut self, capacity: usize) -> Self {
        self.config = self.config.capacity_per_shard(capacity);
        self
    }

    /// Use a custom shard router (e.g. for stateful or custom distribution).
    pub fn routing(mut self, routing: RoutingConfig) -> Self {
        self.config = self.config.routing(routing);
        self
    }

    /// Build a ShardedMap with the configured settings.
    pub fn build<V>(self) -> crate::ShardedMap<V>
    where
        V: Send + Sync,
    {
        crate::ShardedMap::with_config(self.config)
    }
}

#[inline]
pub(crate) fn normalize_shard_count(count: usize) -> usize {
    if count == 0 {
        DEFAULT_SHARD_COUNT
    } else {
        count
    }
}

/// Create a hash function instance based on the configuration.
pub(crate) fn create_hasher(hash_fn: HashFunction) -> ShardHasher {
    match hash_fn {
        HashFunction::Fnv32 => ShardHasher::Fnv32,
        HashFunction::AHash => ShardHasher::AHash,
        #[cfg(feature = "fxhash")]
        HashFunction::FxHash => ShardHasher::FxHash,
    }
}
