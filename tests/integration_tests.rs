use std::sync::Arc;
use strshard::{LockedMap, ShardedMap, ShardedMapBuilder, DEFAULT_SHARD_COUNT};

#[test]
fn test_basic_set_get() {
    let map = ShardedMap::new(4);

    map.set("key1", "value1");
    assert_eq!(*map.get("key1").unwrap(), "value1");

    // Overwrite
    map.set("key1", "value2");
    assert_eq!(*map.get("key1").unwrap(), "value2");
    assert_eq!(map.count(), 1);
}

#[test]
fn test_remove() {
    let map = ShardedMap::new(4);

    map.set("key1", "value1");
    map.remove("key1");
    assert!(map.get("key1").is_none());
    assert!(!map.has("key1"));

    // Removing an absent key is a no-op
    map.remove("key1");
    map.remove("never_there");
    assert!(map.is_empty());
}

#[test]
fn test_pop() {
    let map = ShardedMap::new(4);

    map.set("key1", 7);
    assert_eq!(map.pop("key1").as_deref(), Some(&7));
    assert!(!map.has("key1"));

    assert!(map.pop("key1").is_none());
    assert_eq!(map.count(), 0);
}

#[test]
fn test_set_if_absent() {
    let map = ShardedMap::new(4);

    assert!(map.set_if_absent("key", "v1"));
    assert!(!map.set_if_absent("key", "v2"));
    assert_eq!(*map.get("key").unwrap(), "v1");
}

#[test]
fn test_has() {
    let map = ShardedMap::new(4);
    assert!(!map.has("key"));
    map.set("key", ());
    assert!(map.has("key"));
}

#[test]
fn test_mset() {
    let map = ShardedMap::new(4);
    map.mset([("a", 1), ("b", 2), ("c", 3)]);

    assert_eq!(map.count(), 3);
    assert_eq!(*map.get("b").unwrap(), 2);

    // Later pairs overwrite earlier ones for the same key
    map.mset(vec![("a".to_string(), 10), ("a".to_string(), 11)]);
    assert_eq!(*map.get("a").unwrap(), 11);
}

#[test]
fn test_repeated_set_is_idempotent() {
    let map = ShardedMap::new(4);
    map.set("k", 5);
    let count = map.count();
    map.set("k", 5);
    map.set("k", 5);
    assert_eq!(*map.get("k").unwrap(), 5);
    assert_eq!(map.count(), count);
}

#[test]
fn test_count_and_is_empty() {
    let map = ShardedMap::new(4);

    assert!(map.is_empty());
    assert_eq!(map.count(), 0);

    for i in 0..100 {
        map.set(format!("key_{i}"), i);
    }
    assert_eq!(map.count(), 100);
    assert!(!map.is_empty());

    for i in 0..40 {
        map.remove(&format!("key_{i}"));
    }
    assert_eq!(map.count(), 60);
}

#[test]
fn test_keys() {
    let map = ShardedMap::new(4);
    map.mset([("x", 1), ("y", 2), ("z", 3)]);

    let mut keys = map.keys().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["x", "y", "z"]);

    let empty: ShardedMap<i32> = ShardedMap::new(4);
    assert!(empty.keys().unwrap().is_empty());
}

#[test]
fn test_items() {
    let map = ShardedMap::new(4);
    map.mset([("x", 1), ("y", 2)]);

    let items = map.items();
    assert_eq!(items.len(), 2);
    assert_eq!(*items["x"], 1);
    assert_eq!(*items["y"], 2);
}

#[test]
fn test_iter_cb_visits_every_entry_once() {
    let map = ShardedMap::new(4);
    for i in 0..50 {
        map.set(format!("key_{i}"), i);
    }

    let mut seen = Vec::new();
    map.iter_cb(|key, value| seen.push((key.to_string(), *value)));
    seen.sort_by_key(|(_, v)| *v);

    assert_eq!(seen.len(), 50);
    assert_eq!(seen[0], ("key_0".to_string(), 0));
    assert_eq!(seen[49], ("key_49".to_string(), 49));
}

#[test]
fn test_iter_cb_visits_shards_in_order() {
    let map = ShardedMap::new(8);
    for i in 0..200 {
        map.set(format!("key_{i}"), i);
    }

    let mut shard_order = Vec::new();
    map.iter_cb(|key, _| shard_order.push(map_shard(&map, key)));
    assert!(shard_order.windows(2).all(|w| w[0] <= w[1]));
}

fn map_shard(map: &ShardedMap<i32>, key: &str) -> usize {
    // shard_index takes no lock, so it is safe inside the callback
    map.shard_index(key)
}

#[test]
fn test_default_shard_count() {
    let map: ShardedMap<i32> = ShardedMap::new(0);
    assert_eq!(map.shard_count(), DEFAULT_SHARD_COUNT);
    assert_eq!(map.stats().shard_sizes.len(), 32);
}

#[test]
fn test_non_power_of_two_shard_count() {
    let map = ShardedMapBuilder::new().shard_count(7).build::<i32>();
    for i in 0..70 {
        map.set(format!("key_{i}"), i);
    }
    assert_eq!(map.shard_count(), 7);
    assert_eq!(map.stats().size, 70);
}

#[test]
fn test_stats() {
    let map = ShardedMap::new(16);

    map.set("key1", "value1");
    map.set("key2", "value2");
    map.get("key1");
    map.get("key2");
    map.remove("key1");

    let stats = map.stats();
    assert_eq!(stats.size, 1);
    assert_eq!(stats.shard_sizes.len(), 16);
    assert_eq!(stats.operations.len(), 16);

    #[cfg(feature = "metrics")]
    {
        let total_ops: u64 = stats.operations.iter().map(|op| op.total()).sum();
        assert_eq!(total_ops, 5);
    }
}

#[test]
fn test_arc_sharing() {
    let map = ShardedMap::new(4);

    map.set("key", "value");
    let arc1 = map.get("key").unwrap();
    let arc2 = map.get("key").unwrap();

    // Both should point to the same value
    assert!(Arc::ptr_eq(&arc1, &arc2));

    // A popped value outlives its entry
    let popped = map.pop("key").unwrap();
    assert!(Arc::ptr_eq(&arc1, &popped));
}

#[test]
fn test_coexists_with_locked_map() {
    let sharded = ShardedMap::new(4);
    let single = LockedMap::new();

    for i in 0..20 {
        let key = format!("key_{i}");
        sharded.set(key.as_str(), i);
        single.store(key, i);
    }

    for i in 0..20 {
        let key = format!("key_{i}");
        assert_eq!(sharded.get(&key).as_deref().copied(), single.lookup(&key));
    }

    single.delete("key_3");
    assert_eq!(single.lookup("key_3"), None);
    assert!(sharded.has("key_3"));
}
