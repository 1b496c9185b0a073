//! The structural part of a node: identity, depth, state, and the
//! parent/child wiring of the search DAG.

use indexmap::IndexMap;

use crate::nodes::algorithm_node::{NodeRef, WeakNodeRef};
use crate::state::{State, Turn};

pub type NodeId = u64;
pub type TreeDepth = usize;

/// One tree node per distinct `(depth, tag)` pair reached during a search.
///
/// Children are held strongly, parents weakly: forward steps strictly
/// increase depth, so the strong edges can never form a cycle. A node may
/// have several parents when the same state is reached through different
/// branch sequences (transposition).
pub struct TreeNode<S: State> {
    id: NodeId,
    depth: TreeDepth,
    state: S,
    parents: Vec<(WeakNodeRef<S>, S::Branch)>,
    all_branches_generated: bool,
    branches_children: IndexMap<S::Branch, NodeRef<S>>,
}

impl<S: State> TreeNode<S> {
    pub fn new(id: NodeId, depth: TreeDepth, state: S) -> Self {
        TreeNode {
            id,
            depth,
            state,
            parents: Vec::new(),
            all_branches_generated: false,
            branches_children: IndexMap::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn depth(&self) -> TreeDepth {
        self.depth
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn tag(&self) -> S::Tag {
        self.state.tag()
    }

    pub fn turn(&self) -> Turn {
        self.state.turn()
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn all_branches_generated(&self) -> bool {
        self.all_branches_generated
    }

    pub fn set_all_branches_generated(&mut self, value: bool) {
        self.all_branches_generated = value;
    }

    /// All available branch keys of the underlying state.
    pub fn branch_keys(&self) -> Vec<S::Branch> {
        self.state.branch_keys()
    }

    pub fn branches_children(&self) -> &IndexMap<S::Branch, NodeRef<S>> {
        &self.branches_children
    }

    pub fn child(&self, branch: &S::Branch) -> Option<&NodeRef<S>> {
        self.branches_children.get(branch)
    }

    /// Links `child` under `branch`. Re-opening an already opened branch
    /// overwrites with the same child (dedup happens upstream).
    pub fn insert_child(&mut self, branch: S::Branch, child: NodeRef<S>) {
        self.branches_children.insert(branch, child);
    }

    /// Registers a new parent reached through `branch`. Returns false when
    /// this parent is already linked (the same parent/child pair must
    /// appear exactly once).
    pub fn add_parent(&mut self, branch: S::Branch, parent: &NodeRef<S>) -> bool {
        let weak = std::rc::Rc::downgrade(parent);
        if self.parents.iter().any(|(known, _)| known.ptr_eq(&weak)) {
            return false;
        }
        self.parents.push((weak, branch));
        true
    }

    pub fn parents(&self) -> &[(WeakNodeRef<S>, S::Branch)] {
        &self.parents
    }

    /// Parents with their linking branch, strong references. Nodes stay
    /// alive for the whole search (the descendant index owns them), so
    /// dead weak references are simply skipped.
    pub fn parents_upgraded(&self) -> Vec<(NodeRef<S>, S::Branch)> {
        self.parents
            .iter()
            .filter_map(|(weak, branch)| weak.upgrade().map(|parent| (parent, branch.clone())))
            .collect()
    }
}
