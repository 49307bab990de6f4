//! Content-addressed deduplication over arbitrary byte-serialized
//! values, the primitive underpinning the state repository: a
//! [`SegmentedArena`] owns the bytes, a hash table maps `hash(bytes) ->
//! candidate indices`, and equality is checked by dereferencing the
//! arena pointer of each candidate rather than by re-comparing the
//! caller's original value.

use crate::arena::SegmentedArena;
use hashbrown::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// `insert(v) -> index` where equal serialized values always yield the
/// same, consecutive-from-zero index.
pub struct IndexedHashSet {
    arena: SegmentedArena,
    ptrs: Vec<crate::arena::ArenaPtr>,
    buckets: HashMap<u64, Vec<u32>>,
}

impl Default for IndexedHashSet {
    fn default() -> Self {
        IndexedHashSet {
            arena: SegmentedArena::default(),
            ptrs: Vec::new(),
            buckets: HashMap::new(),
        }
    }
}

fn hash_bytes(bytes: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    hasher.finish()
}

impl IndexedHashSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the serialized value, returning its dense index. If an
    /// equal byte string was already stored, returns the original index
    /// without writing a duplicate.
    pub fn insert(&mut self, bytes: &[u8]) -> u32 {
        let h = hash_bytes(bytes);
        if let Some(candidates) = self.buckets.get(&h) {
            for &idx in candidates {
                if self.get(idx) == bytes {
                    return idx;
                }
            }
        }
        let ptr = self.arena.write(bytes);
        let idx = self.ptrs.len() as u32;
        self.ptrs.push(ptr);
        self.buckets.entry(h).or_default().push(idx);
        idx
    }

    /// Looks up an already-inserted value without inserting it.
    pub fn find(&self, bytes: &[u8]) -> Option<u32> {
        let h = hash_bytes(bytes);
        self.buckets.get(&h).and_then(|candidates| {
            candidates.iter().copied().find(|&idx| self.get(idx) == bytes)
        })
    }

    pub fn get(&self, index: u32) -> &[u8] {
        self.arena.get(self.ptrs[index as usize])
    }

    pub fn len(&self) -> usize {
        self.ptrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ptrs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_values_get_same_index() {
        let mut set = IndexedHashSet::new();
        let a = set.insert(b"abc");
        let b = set.insert(b"xyz");
        let c = set.insert(b"abc");
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn indices_are_dense_from_zero() {
        let mut set = IndexedHashSet::new();
        for i in 0..10u8 {
            let idx = set.insert(&[i]);
            assert_eq!(idx, i as u32);
        }
    }

    #[test]
    fn find_without_inserting() {
        let mut set = IndexedHashSet::new();
        assert_eq!(set.find(b"missing"), None);
        set.insert(b"present");
        assert_eq!(set.find(b"present"), Some(0));
    }
}
