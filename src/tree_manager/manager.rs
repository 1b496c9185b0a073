//! Tree/DAG growth: opening branches, transposition-aware node creation,
//! parent/child wiring.

use std::rc::Rc;

use crate::errors::SearchError;
use crate::indices::index_data::{IndexComputation, IndexData};
use crate::nodes::algorithm_node::{AlgorithmNode, NodeRef};
use crate::state::{RepresentationFactory, State};
use crate::tree_manager::expansion::TreeExpansion;
use crate::trees::tree::Tree;

pub struct TreeManager<S: State> {
    representation_factory: Option<Rc<dyn RepresentationFactory<S>>>,
    index_computation: Option<IndexComputation>,
    depth_extended_index: bool,
    /// Nodes closer than this to the root copy the state history along,
    /// preserving repetition-style terminal detection near the root while
    /// keeping deeper copies shallow.
    history_copy_depth: usize,
}

impl<S: State> TreeManager<S> {
    pub fn new(
        representation_factory: Option<Rc<dyn RepresentationFactory<S>>>,
        index_computation: Option<IndexComputation>,
        depth_extended_index: bool,
        history_copy_depth: usize,
    ) -> Self {
        TreeManager {
            representation_factory,
            index_computation,
            depth_extended_index,
            history_copy_depth,
        }
    }

    fn make_index_data(&self) -> Option<IndexData> {
        self.index_computation
            .map(|computation| IndexData::new(computation, self.depth_extended_index))
    }

    /// Builds the root node of a fresh search. Id 0, no parents.
    pub fn create_root(&self, state: S, depth: usize) -> NodeRef<S> {
        let representation = self
            .representation_factory
            .as_ref()
            .map(|factory| factory.create_from_transition(&state, None, None));
        AlgorithmNode::new(0, depth, state, self.make_index_data(), representation).into_ref()
    }

    /// Opens `branch` out of `parent`: steps a copy of the parent state,
    /// then either reuses the node already known at `(depth + 1, tag)` or
    /// creates a fresh one. Either way the edge is wired both directions
    /// and `branch_count` grows.
    pub fn open_branch(
        &self,
        tree: &mut Tree<S>,
        parent: &NodeRef<S>,
        branch: &S::Branch,
    ) -> Result<TreeExpansion<S>, SearchError> {
        let include_history = tree.node_depth(parent) < self.history_copy_depth;
        let (mut state, child_depth) = {
            let parent_borrow = parent.borrow();
            (
                parent_borrow.state().copy(include_history),
                parent_borrow.depth() + 1,
            )
        };
        let modifications = state.step(branch)?;
        let child_tag = state.tag();

        let existing = if tree.descendants.is_new_generation(child_depth) {
            None
        } else {
            tree.descendants.get(child_depth, &child_tag).cloned()
        };

        let (child, is_new) = match existing {
            Some(child) => {
                // transposition: same state reached through another line
                child.borrow_mut().tree_node_mut().add_parent(branch.clone(), parent);
                (child, false)
            }
            None => {
                let id = tree.nodes_count;
                let representation = self.representation_factory.as_ref().map(|factory| {
                    let parent_borrow = parent.borrow();
                    factory.create_from_transition(
                        &state,
                        parent_borrow.representation(),
                        modifications.as_ref(),
                    )
                });
                let child = AlgorithmNode::new(
                    id,
                    child_depth,
                    state,
                    self.make_index_data(),
                    representation,
                )
                .into_ref();
                child.borrow_mut().tree_node_mut().add_parent(branch.clone(), parent);
                (child, true)
            }
        };

        parent
            .borrow_mut()
            .tree_node_mut()
            .insert_child(branch.clone(), child.clone());
        tree.branch_count += 1;

        Ok(TreeExpansion {
            child,
            parent: Some(parent.clone()),
            modifications,
            is_new,
            branch: Some(branch.clone()),
        })
    }
}
