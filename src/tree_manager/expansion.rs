//! Expansion records: what happened when a `(parent, branch)` pair was
//! opened.

use crate::nodes::algorithm_node::NodeRef;
use crate::state::State;
use crate::trees::tree::Tree;

/// One materialized edge. `is_new` distinguishes a freshly created child
/// from a transposition onto an existing node. The root seeds the log with
/// a synthetic entry carrying no parent and no branch.
pub struct TreeExpansion<S: State> {
    pub child: NodeRef<S>,
    pub parent: Option<NodeRef<S>>,
    pub modifications: Option<S::Modifications>,
    pub is_new: bool,
    pub branch: Option<S::Branch>,
}

/// The expansions of one batch, split by whether a node was created.
/// Iteration yields creations first, then connections, each in insertion
/// order.
pub struct TreeExpansions<S: State> {
    pub with_creation: Vec<TreeExpansion<S>>,
    pub without_creation: Vec<TreeExpansion<S>>,
}

impl<S: State> TreeExpansions<S> {
    pub fn new() -> Self {
        TreeExpansions {
            with_creation: Vec::new(),
            without_creation: Vec::new(),
        }
    }

    pub fn add(&mut self, expansion: TreeExpansion<S>) {
        if expansion.is_new {
            self.with_creation.push(expansion);
        } else {
            self.without_creation.push(expansion);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &TreeExpansion<S>> {
        self.with_creation.iter().chain(self.without_creation.iter())
    }

    pub fn len(&self) -> usize {
        self.with_creation.len() + self.without_creation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.with_creation.is_empty() && self.without_creation.is_empty()
    }
}

impl<S: State> Default for TreeExpansions<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies one expansion's bookkeeping to the tree counters and the
/// descendant index, then records it into the batch log.
pub fn record_expansion<S: State>(
    tree: &mut Tree<S>,
    expansions: &mut TreeExpansions<S>,
    expansion: TreeExpansion<S>,
) {
    if expansion.is_new {
        tree.nodes_count += 1;
        tree.descendants.add(&expansion.child);
    }
    expansions.add(expansion);
}
