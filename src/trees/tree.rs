//! The search tree: root node, depth-indexed descendants and the two
//! growth counters.

use crate::nodes::algorithm_node::NodeRef;
use crate::nodes::tree_node::TreeDepth;
use crate::state::State;
use crate::trees::descendants::RangedDescendants;

pub struct Tree<S: State> {
    root: NodeRef<S>,
    pub descendants: RangedDescendants<S>,
    /// Distinct nodes in the tree. Only grows on novel `(depth, tag)`
    /// pairs.
    pub nodes_count: u64,
    /// Edges inserted so far. Unlike `nodes_count` this grows on every
    /// opening, transposition or not.
    pub branch_count: u64,
    root_depth: TreeDepth,
}

impl<S: State> Tree<S> {
    pub fn new(root: NodeRef<S>, descendants: RangedDescendants<S>) -> Self {
        let root_depth = root.borrow().depth();
        Tree {
            root,
            descendants,
            nodes_count: 1,
            branch_count: 0,
            root_depth,
        }
    }

    pub fn root(&self) -> &NodeRef<S> {
        &self.root
    }

    /// Depth of the root in absolute terms (external depth offsets are
    /// permitted).
    pub fn root_depth(&self) -> TreeDepth {
        self.root_depth
    }

    /// Depth of `node` relative to this search's root.
    pub fn node_depth(&self, node: &NodeRef<S>) -> TreeDepth {
        node.borrow().depth() - self.root_depth
    }

    /// The principal line from the root, readable, with node ids.
    pub fn best_line_string(&self) -> String {
        let mut result = format!("Best line from node {}: ", self.root.borrow().id());
        let sequence = self.root.borrow().evaluation().best_branch_sequence().to_vec();
        let mut current = self.root.clone();
        for branch in sequence {
            let Some(child) = current.borrow().tree_node().child(&branch).cloned() else {
                break;
            };
            result.push_str(&format!(
                "{} ({}) ",
                current.borrow().state().branch_name(&branch),
                child.borrow().id()
            ));
            current = child;
        }
        result
    }

    /// One-line summary of the tree counters and per-depth population.
    pub fn stats_string(&self) -> String {
        let mut result = format!(
            "branch_count {} node_count {} |",
            self.branch_count,
            self.descendants.count()
        );
        for depth in self.descendants.depths() {
            result.push_str(&format!(" d{}:{}", depth, self.descendants.count_at(depth)));
        }
        result
    }
}
