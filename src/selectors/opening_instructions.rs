//! Opening instructions: insertion-ordered batches of `(node, branch)`
//! pairs to materialize next. Later entries are higher priority, and
//! budget trimming pops from the tail.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::nodes::algorithm_node::NodeRef;
use crate::nodes::tree_node::NodeId;
use crate::state::State;

pub struct OpeningInstruction<S: State> {
    pub node_to_open: NodeRef<S>,
    pub branch: S::Branch,
}

/// A batch of opening instructions, keyed by `(node id, branch)` for
/// redundancy-proof insertion while keeping clean records as values.
pub struct OpeningInstructions<S: State> {
    batch: IndexMap<(NodeId, S::Branch), OpeningInstruction<S>>,
}

impl<S: State> OpeningInstructions<S> {
    pub fn new() -> Self {
        OpeningInstructions {
            batch: IndexMap::new(),
        }
    }

    pub fn insert(&mut self, instruction: OpeningInstruction<S>) {
        let key = (
            instruction.node_to_open.borrow().id(),
            instruction.branch.clone(),
        );
        self.batch.entry(key).or_insert(instruction);
    }

    /// Merges `other` into this batch; already-present keys keep their
    /// earlier position.
    pub fn merge(&mut self, other: OpeningInstructions<S>) {
        for (key, instruction) in other.batch {
            self.batch.entry(key).or_insert(instruction);
        }
    }

    /// Pops up to `how_many` instructions from the tail into `popped`.
    pub fn pop_items(&mut self, how_many: usize, popped: &mut OpeningInstructions<S>) {
        let how_many = how_many.min(self.batch.len());
        for _ in 0..how_many {
            let (key, instruction) = self.batch.pop().expect("length checked");
            popped.batch.insert(key, instruction);
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &OpeningInstruction<S>> {
        self.batch.values()
    }

    pub fn into_values(self) -> impl Iterator<Item = OpeningInstruction<S>> {
        self.batch.into_values()
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }
}

impl<S: State> Default for OpeningInstructions<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// How a selected node is opened. Only full opening is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OpeningType {
    #[default]
    AllChildren,
}

/// Turns a selected node into the branch list to open, flipping the
/// node's generation flag.
pub struct OpeningInstructor {
    opening_type: OpeningType,
}

impl OpeningInstructor {
    pub fn new(opening_type: OpeningType) -> Self {
        OpeningInstructor { opening_type }
    }

    pub fn all_branches_to_open<S: State>(&self, node_to_open: &NodeRef<S>) -> Vec<S::Branch> {
        match self.opening_type {
            OpeningType::AllChildren => {
                let mut node = node_to_open.borrow_mut();
                node.tree_node_mut().set_all_branches_generated(true);
                node.tree_node().branch_keys()
            }
        }
    }
}

/// One instruction per branch, in branch order, all targeting `node`.
pub fn instructions_to_open_all_branches<S: State>(
    branches: Vec<S::Branch>,
    node: &NodeRef<S>,
) -> OpeningInstructions<S> {
    let mut batch = OpeningInstructions::new();
    for branch in branches {
        batch.insert(OpeningInstruction {
            node_to_open: node.clone(),
            branch,
        });
    }
    batch
}
