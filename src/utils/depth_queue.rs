//! A depth-bucketed multimap with an efficient "pop deepest" primitive.
//!
//! Entries live in per-depth buckets that preserve insertion order; popping
//! removes the most recently inserted entry of the deepest bucket. The
//! update scheduler relies on this to process children before their
//! parents in the DAG.

use std::collections::BTreeMap;
use std::hash::Hash;

use indexmap::IndexMap;

pub struct DepthKeyedQueue<K, V> {
    buckets: BTreeMap<usize, IndexMap<K, V>>,
    len: usize,
}

impl<K: Eq + Hash, V> DepthKeyedQueue<K, V> {
    pub fn new() -> Self {
        DepthKeyedQueue {
            buckets: BTreeMap::new(),
            len: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn max_depth(&self) -> Option<usize> {
        self.buckets.keys().next_back().copied()
    }

    pub fn contains(&self, depth: usize, key: &K) -> bool {
        self.buckets
            .get(&depth)
            .map_or(false, |bucket| bucket.contains_key(key))
    }

    /// Returns the entry at `(depth, key)`, inserting `default()` first if
    /// it is absent.
    pub fn entry_or_insert_with(
        &mut self,
        depth: usize,
        key: K,
        default: impl FnOnce() -> V,
    ) -> &mut V {
        let bucket = self.buckets.entry(depth).or_default();
        match bucket.entry(key) {
            indexmap::map::Entry::Occupied(entry) => entry.into_mut(),
            indexmap::map::Entry::Vacant(entry) => {
                self.len += 1;
                entry.insert(default())
            }
        }
    }

    /// Removes and returns the most recently inserted entry of the deepest
    /// bucket.
    pub fn pop_deepest(&mut self) -> Option<(K, V)> {
        let depth = self.max_depth()?;
        let bucket = self.buckets.get_mut(&depth).expect("max depth bucket");
        let popped = bucket.pop();
        if bucket.is_empty() {
            self.buckets.remove(&depth);
        }
        if popped.is_some() {
            self.len -= 1;
        }
        popped
    }
}

impl<K: Eq + Hash, V> Default for DepthKeyedQueue<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
