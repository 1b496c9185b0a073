//! The full per-node record: structural tree node, minimax bookkeeping,
//! exploration index data and the optional evaluator-input representation.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::indices::index_data::IndexData;
use crate::nodes::minimax::TreeEvaluation;
use crate::nodes::tree_node::{NodeId, TreeDepth, TreeNode};
use crate::state::{State, Turn};

pub type NodeRef<S> = Rc<RefCell<AlgorithmNode<S>>>;
pub type WeakNodeRef<S> = Weak<RefCell<AlgorithmNode<S>>>;

pub struct AlgorithmNode<S: State> {
    tree_node: TreeNode<S>,
    evaluation: TreeEvaluation<S>,
    exploration: Option<IndexData>,
    representation: Option<S::Representation>,
}

impl<S: State> AlgorithmNode<S> {
    pub fn new(
        id: NodeId,
        depth: TreeDepth,
        state: S,
        exploration: Option<IndexData>,
        representation: Option<S::Representation>,
    ) -> Self {
        AlgorithmNode {
            tree_node: TreeNode::new(id, depth, state),
            evaluation: TreeEvaluation::new(),
            exploration,
            representation,
        }
    }

    pub fn into_ref(self) -> NodeRef<S> {
        Rc::new(RefCell::new(self))
    }

    pub fn id(&self) -> NodeId {
        self.tree_node.id()
    }

    pub fn depth(&self) -> TreeDepth {
        self.tree_node.depth()
    }

    pub fn tag(&self) -> S::Tag {
        self.tree_node.tag()
    }

    pub fn turn(&self) -> Turn {
        self.tree_node.turn()
    }

    pub fn state(&self) -> &S {
        self.tree_node.state()
    }

    pub fn tree_node(&self) -> &TreeNode<S> {
        &self.tree_node
    }

    pub fn tree_node_mut(&mut self) -> &mut TreeNode<S> {
        &mut self.tree_node
    }

    pub fn evaluation(&self) -> &TreeEvaluation<S> {
        &self.evaluation
    }

    pub fn evaluation_mut(&mut self) -> &mut TreeEvaluation<S> {
        &mut self.evaluation
    }

    pub fn exploration(&self) -> Option<&IndexData> {
        self.exploration.as_ref()
    }

    pub fn exploration_mut(&mut self) -> Option<&mut IndexData> {
        self.exploration.as_mut()
    }

    pub fn representation(&self) -> Option<&S::Representation> {
        self.representation.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.evaluation.is_over()
    }

    /// Description of the node in DOT format: identity plus the current
    /// evaluation state.
    pub fn dot_description(&self) -> String {
        let mut description = format!(
            "id:{} dep:{}\ntag:{:?}\n{}",
            self.id(),
            self.depth(),
            self.tag(),
            self.evaluation.dot_description(),
        );
        if let Some(exploration) = &self.exploration {
            description.push('\n');
            description.push_str(&exploration.dot_description());
        }
        description
    }
}
