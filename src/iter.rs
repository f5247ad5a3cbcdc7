//! Snapshot and fan-in iteration across shards.
//!
//! A traversal runs in two phases. First, one worker per shard takes the
//! shard's read lock, allocates a channel sized to the shard's current length
//! and reports it back; the initiating call blocks until every shard has
//! reported. Then each worker pushes its entries and releases its lock while a
//! single fan-in worker drains the per-shard channels in shard order into one
//! output channel, which disconnects once every shard channel has been drained.
//!
//! Every traversal spawns `shard_count + 1` OS threads and every key
//! collection spawns `shard_count` scoped threads, so thread count grows
//! linearly with the shard count.
//!
//! Each shard is captured consistently under its own lock, but there is no
//! cross-shard consistency: shards are visited concurrently, so one shard may
//! reflect writes that another shard's capture missed.

use crate::error::Error;
use crate::shard::Shard;
use flume::{Receiver, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, trace};

/// One entry carried from a shard to the consumer of a traversal.
pub type Tuple<V> = (String, Arc<V>);

/// The in-flight capture of one shard.
pub(crate) struct ShardSnapshot<V> {
    index: usize,
    len: usize,
    rx: Receiver<Tuple<V>>,
}

/// How the merged output channel is sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputBuffer {
    /// Exactly the sum of all shard sizes, so fan-in never blocks.
    Exact,
    /// Rendezvous channel: fan-in hands entries over one at a time.
    Rendezvous,
}

/// Lazy, one-shot iterator over every entry captured by a snapshot.
///
/// Dropping it before it is exhausted disconnects the output channel. The
/// background workers notice on their next send, stop, and release any shard
/// lock they still hold.
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
/// let mut entries: Vec<_> = map
///     .iter_buffered()?
///     .map(|(key, value)| (key, *value))
///     .collect();
/// entries.sort();
/// assert_eq!(entries, vec![("a".to_string(), 1), ("b".to_string(), 2)]);
/// # Ok::<(), strshard::Error>(())
/// ```
pub struct Snapshot<V> {
    entries: flume::IntoIter<Tuple<V>>,
    total: usize,
    yielded: usize,
}

impl<V> Snapshot<V> {
    /// Number of entries captured across all shards when the snapshot was sized.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl<V> Iterator for Snapshot<V> {
    type Item = Tuple<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.entries.next()?;
        self.yielded += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.total.saturating_sub(self.yielded)))
    }
}

impl<V> std::fmt::Debug for Snapshot<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Snapshot")
            .field("total", &self.total)
            .field("yielded", &self.yielded)
            .finish()
    }
}

/// Snapshot every shard and fan the captures into a single iterator.
pub(crate) fn traverse<V>(shards: &Arc<[Shard<V>]>, buffer: OutputBuffer) -> Result<Snapshot<V>, Error>
where
    V: Send + Sync + 'static,
{
    let chans = snapshot(shards)?;
    let total: usize = chans.iter().map(|chan| chan.len).sum();
    debug!(shards = chans.len(), total, ?buffer, "snapshot sized");

    let (out, entries) = match buffer {
        OutputBuffer::Exact => flume::bounded(total),
        OutputBuffer::Rendezvous => flume::bounded(0),
    };
    fan_in(chans, out)?;

    Ok(Snapshot {
        entries: entries.into_iter(),
        total,
        yielded: 0,
    })
}

/// Start one worker thread per shard and wait until each has sized its channel.
///
/// Returns before the channels are populated.
pub(crate) fn snapshot<V>(shards: &Arc<[Shard<V>]>) -> Result<Vec<ShardSnapshot<V>>, Error>
where
    V: Send + Sync + 'static,
{
    // Workers lock on other threads, so check for callback re-entry up front.
    shards.iter().for_each(Shard::check_reentrancy);

    let expected = shards.len();
    let (sized_tx, sized_rx) = flume::bounded(expected);

    for index in 0..expected {
        let shards = Arc::clone(shards);
        let sized_tx = sized_tx.clone();
        thread::Builder::new()
            .name(format!("strshard-snapshot-{index}"))
            .spawn(move || produce(&shards[index], index, sized_tx))?;
    }
    drop(sized_tx);

    let mut slots: Vec<Option<ShardSnapshot<V>>> = (0..expected).map(|_| None).collect();
    for reported in 0..expected {
        match sized_rx.recv() {
            Ok(chan) => {
                let index = chan.index;
                slots[index] = Some(chan);
            }
            Err(_) => return Err(Error::SnapshotInterrupted { reported, expected }),
        }
    }
    Ok(slots.into_iter().flatten().collect())
}

/// Capture one shard: size its channel, report, then push every entry.
fn produce<V>(shard: &Shard<V>, index: usize, sized: Sender<ShardSnapshot<V>>) {
    let map = shard.read();
    let len = map.len();
    let (tx, rx) = flume::bounded(len);
    if sized.send(ShardSnapshot { index, len, rx }).is_err() {
        debug!(shard = index, "snapshot abandoned before sizing completed");
        return;
    }
    drop(sized);

    for (key, value) in map.iter() {
        if tx.send((key.clone(), Arc::clone(value))).is_err() {
            debug!(shard = index, "snapshot consumer went away, stopping shard worker");
            return;
        }
    }
    trace!(shard = index, entries = len, "shard captured");
}

/// Drain every shard channel into `out`, one shard at a time in index order.
///
/// `out` disconnects once the fan-in worker has drained every shard channel
/// and dropped its sender.
pub(crate) fn fan_in<V>(chans: Vec<ShardSnapshot<V>>, out: Sender<Tuple<V>>) -> Result<(), Error>
where
    V: Send + Sync + 'static,
{
    thread::Builder::new()
        .name("strshard-fan-in".to_string())
        .spawn(move || {
            for chan in chans {
                for tuple in chan.rx.iter() {
                    if out.send(tuple).is_err() {
                        debug!(shard = chan.index, "iterator dropped, stopping fan-in");
                        return;
                    }
                }
            }
        })?;
    Ok(())
}

/// Collect every key, one scoped worker per shard feeding a channel sized to
/// the current count.
pub(crate) fn collect_keys<V>(shards: &[Shard<V>], count: usize) -> Result<Vec<String>, Error>
where
    V: Send + Sync,
{
    shards.iter().for_each(Shard::check_reentrancy);

    thread::scope(|scope| -> Result<Vec<String>, Error> {
        let (tx, rx) = flume::bounded(count);
        for (index, shard) in shards.iter().enumerate() {
            let tx = tx.clone();
            thread::Builder::new()
                .name(format!("strshard-keys-{index}"))
                .spawn_scoped(scope, move || {
                    let map = shard.read();
                    for key in map.keys() {
                        if tx.send(key.clone()).is_err() {
                            return;
                        }
                    }
                })?;
        }
        drop(tx);

        let mut keys = Vec::with_capacity(count);
        keys.extend(rx.iter());
        Ok(keys)
    })
}
