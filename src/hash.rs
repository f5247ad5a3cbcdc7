use std::hash::{Hash, Hasher};

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

/// 32-bit FNV hash of `key`, multiplying before the xor on every byte.
///
/// Pure function of the key bytes, so the result is identical across runs,
/// processes and platforms.
///
/// ```rust
/// use strshard::hash::fnv32;
///
/// assert_eq!(fnv32(b""), 2_166_136_261);
/// assert_eq!(fnv32(b"key"), fnv32(b"key"));
/// ```
#[inline]
pub fn fnv32(key: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in key {
        hash = hash.wrapping_mul(FNV_PRIME);
        hash ^= u32::from(byte);
    }
    hash
}

/// Hash function implementation for shard assignment.
/// Uses an enum to avoid trait object limitations with generics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShardHasher {
    /// 32-bit FNV (default, stable across runs and platforms).
    #[default]
    Fnv32,
    /// AHash with fixed keys (fast, not stable across crate versions).
    AHash,
    /// FxHash implementation (faster but potentially less distributed).
    #[cfg(feature = "fxhash")]
    FxHash,
}

impl ShardHasher {
    /// Hash a key to determine which shard it belongs to.
    pub fn hash_key(&self, key: &str) -> u64 {
        match self {
            ShardHasher::Fnv32 => u64::from(fnv32(key.as_bytes())),
            ShardHasher::AHash => {
                let mut hasher = ahash::AHasher::default();
                key.hash(&mut hasher);
                hasher.finish()
            }
            #[cfg(feature = "fxhash")]
            ShardHasher::FxHash => {
                let mut hasher = fxhash::FxHasher::default();
                key.hash(&mut hasher);
                hasher.finish()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_key_is_offset_basis() {
        assert_eq!(fnv32(b""), FNV_OFFSET_BASIS);
    }

    #[test]
    fn test_single_byte() {
        // (basis * prime) ^ 'a', with 32-bit wraparound
        let expected = FNV_OFFSET_BASIS.wrapping_mul(FNV_PRIME) ^ 0x61;
        assert_eq!(fnv32(b"a"), expected);
        assert_eq!(fnv32(b"a"), 0x050c_5d7e);
    }

    #[test]
    fn test_multiplies_before_xor() {
        let xor_first = (FNV_OFFSET_BASIS ^ 0x61).wrapping_mul(FNV_PRIME);
        assert_ne!(fnv32(b"a"), xor_first);
    }

    #[test]
    fn test_fnv_hasher_matches_fnv32() {
        assert_eq!(
            ShardHasher::Fnv32.hash_key("hello"),
            u64::from(fnv32(b"hello"))
        );
    }

    #[test]
    fn test_ahash_is_deterministic_within_process() {
        let hasher = ShardHasher::AHash;
        assert_eq!(hasher.hash_key("hello"), hasher.hash_key("hello"));
    }
}
