//! Dense-index-keyed containers, generalised over any [`Idx`] key.
//!
//! A `RefVec` is a plain append-only `Vec` addressed by a typed index
//! instead of `usize`, and a `RefPool` additionally deduplicates by
//! value, handing back the index of an existing equal entry instead of
//! inserting a duplicate — the same "assigns each distinct value a
//! dense integer index" contract the state repository relies on,
//! specialised to small, directly-hashable values instead of the
//! byte-level [`crate::indexed_hash_set::IndexedHashSet`].

use crate::index::Idx;
use hashbrown::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// Append-only, densely keyed vector.
#[derive(Clone)]
pub struct RefVec<K: Idx, V> {
    items: Vec<V>,
    _key: PhantomData<K>,
}

impl<K: Idx, V> Default for RefVec<K, V> {
    fn default() -> Self {
        RefVec {
            items: Vec::new(),
            _key: PhantomData,
        }
    }
}

impl<K: Idx, V> RefVec<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, value: V) -> K {
        let k = K::from_usize(self.items.len());
        self.items.push(value);
        k
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, k: K) -> Option<&V> {
        self.items.get(k.to_usize())
    }

    pub fn last_key(&self) -> Option<K> {
        if self.items.is_empty() {
            None
        } else {
            Some(K::from_usize(self.items.len() - 1))
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        (0..self.items.len()).map(K::from_usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> + '_ {
        self.items.iter().enumerate().map(|(i, v)| (K::from_usize(i), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut V> + '_ {
        self.items.iter_mut()
    }

    pub fn as_slice(&self) -> &[V] {
        &self.items
    }
}

impl<K: Idx, V> Index<K> for RefVec<K, V> {
    type Output = V;
    fn index(&self, k: K) -> &V {
        &self.items[k.to_usize()]
    }
}
impl<K: Idx, V> IndexMut<K> for RefVec<K, V> {
    fn index_mut(&mut self, k: K) -> &mut V {
        &mut self.items[k.to_usize()]
    }
}

/// Append-only vector that grows on out-of-order writes, filling the
/// gap with a default value. Used where a key space (e.g. per-literal
/// watcher lists keyed on a densely-ranked type) is sparsely populated
/// in insertion order but not contiguous from the start.
impl<K: Idx, V: Default + Clone> RefVec<K, V> {
    pub fn get_or_grow(&mut self, k: K) -> &mut V {
        while self.last_key().filter(|&last| last >= k).is_none() {
            self.push(V::default());
        }
        &mut self.items[k.to_usize()]
    }
}

/// A deduplicating pool: repeated insertion of an equal value returns
/// the same key.
#[derive(Clone)]
pub struct RefPool<K: Idx, V: Eq + Hash + Clone> {
    items: RefVec<K, V>,
    index_of: HashMap<V, K>,
}

impl<K: Idx, V: Eq + Hash + Clone> Default for RefPool<K, V> {
    fn default() -> Self {
        RefPool {
            items: RefVec::new(),
            index_of: HashMap::new(),
        }
    }
}

impl<K: Idx, V: Eq + Hash + Clone> RefPool<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value`, returning its (possibly pre-existing) key.
    pub fn push(&mut self, value: V) -> K {
        if let Some(&k) = self.index_of.get(&value) {
            return k;
        }
        let k = self.items.push(value.clone());
        self.index_of.insert(value, k);
        k
    }

    pub fn get_ref(&self, value: &V) -> Option<K> {
        self.index_of.get(value).copied()
    }

    pub fn get(&self, k: K) -> &V {
        &self.items[k]
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
        self.items.keys()
    }
}

impl<K: Idx, V: Eq + Hash + Clone> Index<K> for RefPool<K, V> {
    type Output = V;
    fn index(&self, k: K) -> &V {
        self.get(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::define_index;

    define_index! {
        pub struct TKey;
    }

    #[test]
    fn ref_vec_push_and_index() {
        let mut v: RefVec<TKey, &str> = RefVec::new();
        let a = v.push("alpha");
        let b = v.push("beta");
        assert_eq!(v[a], "alpha");
        assert_eq!(v[b], "beta");
        assert_eq!(v.len(), 2);
    }

    #[test]
    fn ref_pool_deduplicates() {
        let mut p: RefPool<TKey, String> = RefPool::new();
        let a = p.push("same".to_string());
        let b = p.push("same".to_string());
        let c = p.push("different".to_string());
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(p.len(), 2);
    }
}
