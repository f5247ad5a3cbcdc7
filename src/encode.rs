//! Flattening a [`ShardedMap`] into a plain key/value mapping for encoders.
//!
//! The output carries no shard placement, just one map entry per key. There
//! is no `Deserialize`: values are opaque to the map, so an
//! encoded document cannot be turned back into `V` without knowing the target
//! type. Decode into your own `HashMap<String, T>` and [`mset`] it instead.
//!
//! [`mset`]: ShardedMap::mset

use crate::error::Error;
use crate::ShardedMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

impl<V> Serialize for ShardedMap<V>
where
    V: Serialize + Send + Sync + 'static,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries = self.iter_buffered().map_err(serde::ser::Error::custom)?;
        let mut map = serializer.serialize_map(Some(entries.total()))?;
        for (key, value) in entries {
            map.serialize_entry(&key, value.as_ref())?;
        }
        map.end()
    }
}

impl<V> ShardedMap<V>
where
    V: Serialize + Send + Sync + 'static,
{
    /// Encode a snapshot of every entry as a JSON object.
    ///
    /// ```rust
    /// use strshard::ShardedMap;
    ///
    /// let map = ShardedMap::new(4);
    /// map.set("a", 1);
    /// assert_eq!(map.to_json()?, r#"{"a":1}"#);
    /// # Ok::<(), strshard::Error>(())
    /// ```
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Same as [`to_json`](Self::to_json), indented.
    pub fn to_json_pretty(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_projection_is_flat_object() {
        let map = ShardedMap::new(4);
        map.set("a", 1);
        map.set("b", 2);
        map.set("c", 3);
        map.pop("b");

        let value: Value = serde_json::from_str(&map.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"a": 1, "c": 3}));
    }

    #[test]
    fn test_empty_map_encodes_to_empty_object() {
        let map: ShardedMap<String> = ShardedMap::new(2);
        assert_eq!(map.to_json().unwrap(), "{}");
    }

    #[test]
    fn test_pretty_output_parses() {
        let map = ShardedMap::new(2);
        map.set("nested", vec![1, 2]);
        let value: Value = serde_json::from_str(&map.to_json_pretty().unwrap()).unwrap();
        assert_eq!(value["nested"], json!([1, 2]));
    }
}
