use thiserror::Error;

/// Errors that can occur when operating on a ShardedMap.
///
/// Key absence is never an error; lookups return `Option` instead. These
/// variants only cover the worker threads behind snapshot iteration and the
/// JSON projection.
#[derive(Debug, Error)]
pub enum Error {
    /// The OS refused to start a snapshot or fan-in worker thread.
    #[error("failed to spawn iteration worker: {0}")]
    Spawn(#[from] std::io::Error),
    /// A shard worker exited before reporting the size of its shard.
    #[error("shard worker exited before reporting its size ({reported} of {expected} shards sized)")]
    SnapshotInterrupted {
        /// Shards that reported a size before the failure.
        reported: usize,
        /// Shards in the map.
        expected: usize,
    },
    /// Encoding the flattened map failed.
    #[error("failed to encode map: {0}")]
    Encode(#[from] serde_json::Error),
}
