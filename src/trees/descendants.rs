//! Depth-bucketed node collections used for transposition detection and
//! level-by-level iteration.
//!
//! `Descendants` tolerates gaps between depths (selector bookkeeping
//! removes nodes from arbitrary depths); `RangedDescendants` additionally
//! guarantees a contiguous depth range and is what the tree itself uses.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use crate::nodes::algorithm_node::NodeRef;
use crate::nodes::tree_node::TreeDepth;
use crate::state::State;

pub struct Descendants<S: State> {
    at_depth: BTreeMap<TreeDepth, IndexMap<S::Tag, NodeRef<S>>>,
    count: usize,
}

impl<S: State> Descendants<S> {
    pub fn new() -> Self {
        Descendants {
            at_depth: BTreeMap::new(),
            count: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn depths(&self) -> impl Iterator<Item = TreeDepth> + '_ {
        self.at_depth.keys().copied()
    }

    pub fn has_depth(&self, depth: TreeDepth) -> bool {
        self.at_depth.contains_key(&depth)
    }

    pub fn count_at(&self, depth: TreeDepth) -> usize {
        self.at_depth.get(&depth).map_or(0, IndexMap::len)
    }

    pub fn contains(&self, depth: TreeDepth, tag: &S::Tag) -> bool {
        self.at_depth
            .get(&depth)
            .map_or(false, |bucket| bucket.contains_key(tag))
    }

    pub fn contains_node(&self, node: &NodeRef<S>) -> bool {
        let (depth, tag) = {
            let node = node.borrow();
            (node.depth(), node.tag())
        };
        self.contains(depth, &tag)
    }

    pub fn get(&self, depth: TreeDepth, tag: &S::Tag) -> Option<&NodeRef<S>> {
        self.at_depth.get(&depth)?.get(tag)
    }

    /// Nodes at `depth` in insertion order.
    pub fn nodes_at(&self, depth: TreeDepth) -> Vec<NodeRef<S>> {
        self.at_depth
            .get(&depth)
            .map(|bucket| bucket.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn add(&mut self, node: &NodeRef<S>) {
        let (depth, tag) = {
            let node = node.borrow();
            (node.depth(), node.tag())
        };
        let bucket = self.at_depth.entry(depth).or_default();
        assert!(
            !bucket.contains_key(&tag),
            "two descendants with the same tag at one depth"
        );
        bucket.insert(tag, node.clone());
        self.count += 1;
    }

    pub fn remove(&mut self, node: &NodeRef<S>) {
        let (depth, tag) = {
            let node = node.borrow();
            (node.depth(), node.tag())
        };
        let bucket = self
            .at_depth
            .get_mut(&depth)
            .expect("removal at an unknown depth");
        bucket
            .shift_remove(&tag)
            .expect("removal of an unknown descendant");
        self.count -= 1;
        if bucket.is_empty() {
            self.at_depth.remove(&depth);
        }
    }

    /// Consistency check used by tests: the aggregate count matches the
    /// bucket contents.
    pub fn check_consistency(&self) {
        let sum: usize = self.at_depth.values().map(IndexMap::len).sum();
        assert_eq!(self.count, sum);
        for bucket in self.at_depth.values() {
            assert!(!bucket.is_empty());
        }
    }
}

impl<S: State> Default for Descendants<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Descendants with a contiguous `[min_depth, max_depth]` range. Inserting
/// into a gapped depth is rejected.
pub struct RangedDescendants<S: State> {
    base: Descendants<S>,
    min_depth: Option<TreeDepth>,
    max_depth: Option<TreeDepth>,
}

impl<S: State> RangedDescendants<S> {
    pub fn new() -> Self {
        RangedDescendants {
            base: Descendants::new(),
            min_depth: None,
            max_depth: None,
        }
    }

    pub fn count(&self) -> usize {
        self.base.count()
    }

    pub fn is_empty(&self) -> bool {
        self.base.is_empty()
    }

    pub fn min_depth(&self) -> Option<TreeDepth> {
        self.min_depth
    }

    pub fn max_depth(&self) -> Option<TreeDepth> {
        self.max_depth
    }

    pub fn depths(&self) -> impl Iterator<Item = TreeDepth> + '_ {
        self.base.depths()
    }

    pub fn has_depth(&self, depth: TreeDepth) -> bool {
        self.base.has_depth(depth)
    }

    pub fn count_at(&self, depth: TreeDepth) -> usize {
        self.base.count_at(depth)
    }

    pub fn contains(&self, depth: TreeDepth, tag: &S::Tag) -> bool {
        self.base.contains(depth, tag)
    }

    pub fn contains_node(&self, node: &NodeRef<S>) -> bool {
        self.base.contains_node(node)
    }

    pub fn get(&self, depth: TreeDepth, tag: &S::Tag) -> Option<&NodeRef<S>> {
        self.base.get(depth, tag)
    }

    pub fn nodes_at(&self, depth: TreeDepth) -> Vec<NodeRef<S>> {
        self.base.nodes_at(depth)
    }

    /// Whether adding at `depth` would extend the range by one (or start
    /// it).
    pub fn is_new_generation(&self, depth: TreeDepth) -> bool {
        match self.max_depth {
            Some(max_depth) => depth == max_depth + 1,
            None => true,
        }
    }

    pub fn is_in_current_range(&self, depth: TreeDepth) -> bool {
        match (self.min_depth, self.max_depth) {
            (Some(min_depth), Some(max_depth)) => depth >= min_depth && depth <= max_depth,
            _ => false,
        }
    }

    fn is_in_acceptable_range(&self, depth: TreeDepth) -> bool {
        match (self.min_depth, self.max_depth) {
            (Some(min_depth), Some(max_depth)) => depth >= min_depth && depth <= max_depth + 1,
            _ => true,
        }
    }

    /// Inserts a node at its depth
    ///
    /// # Parameters
    /// * `node` - The node to insert; its depth must fall inside
    ///   `[min_depth, max_depth + 1]`
    ///
    /// # Panics
    /// On a gapped depth (out of range) or a duplicate tag at that depth
    pub fn add(&mut self, node: &NodeRef<S>) {
        let depth = node.borrow().depth();
        assert!(
            self.is_in_acceptable_range(depth),
            "descendant depth out of range"
        );
        if self.is_in_current_range(depth) {
            self.base.add(node);
        } else {
            assert!(self.is_new_generation(depth), "descendant depth out of range");
            self.base.add(node);
            match self.max_depth {
                Some(max_depth) => self.max_depth = Some(max_depth + 1),
                None => {
                    self.min_depth = Some(depth);
                    self.max_depth = Some(depth);
                }
            }
        }
    }

    /// Removes a node; an emptied boundary bucket retracts the range, and
    /// removing the last node resets both bounds
    pub fn remove(&mut self, node: &NodeRef<S>) {
        let depth = node.borrow().depth();
        self.base.remove(node);
        if !self.base.has_depth(depth) {
            if self.min_depth == self.max_depth && Some(depth) == self.min_depth {
                self.min_depth = None;
                self.max_depth = None;
                assert!(self.base.is_empty());
            } else if Some(depth) == self.max_depth {
                self.max_depth = Some(depth - 1);
            } else if Some(depth) == self.min_depth {
                self.min_depth = Some(depth + 1);
            }
        }
    }

    /// Consistency check used by tests: contiguous range, all buckets
    /// non-empty, counts add up.
    pub fn check_consistency(&self) {
        self.base.check_consistency();
        match (self.min_depth, self.max_depth) {
            (None, None) => assert!(self.base.is_empty()),
            (Some(min_depth), Some(max_depth)) => {
                for depth in min_depth..=max_depth {
                    assert!(self.base.has_depth(depth));
                }
            }
            _ => panic!("half-set depth range"),
        }
        for depth in self.depths() {
            assert!(self.is_in_current_range(depth));
        }
    }
}

impl<S: State> Default for RangedDescendants<S> {
    fn default() -> Self {
        Self::new()
    }
}
