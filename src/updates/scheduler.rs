//! Backward propagation: a depth-max queue pushes value / over /
//! best-branch facts from children to all their parents, bottom-up.
//!
//! Processing by decreasing depth guarantees that in the DAG every child
//! finishes before any of its parents (edges connect adjacent depths), so
//! a parent notified through several branches is popped once with all of
//! its pending branches accumulated.

use crate::nodes::algorithm_node::NodeRef;
use crate::nodes::tree_node::NodeId;
use crate::state::State;
use crate::tree_manager::expansion::TreeExpansions;
use crate::updates::blocks::{PendingUpdates, UpdatesFromOneNode};
use crate::utils::depth_queue::DepthKeyedQueue;

pub struct UpdateScheduler {
    /// When set, the scheduler also maintains the depth-extended
    /// `max_depth_descendants` counters during the same bottom-up pass.
    depth_extended_index: bool,
}

impl UpdateScheduler {
    pub fn new(depth_extended_index: bool) -> Self {
        UpdateScheduler {
            depth_extended_index,
        }
    }

    /// Propagates the consequences of one expansion batch up the DAG.
    pub fn propagate<S: State>(&self, expansions: &TreeExpansions<S>) {
        let mut queue: DepthKeyedQueue<NodeId, (NodeRef<S>, PendingUpdates<S>)> =
            DepthKeyedQueue::new();

        // Seed: each opened branch notifies its parent in every dimension
        // the new child already carries.
        for expansion in expansions.iter() {
            let Some(parent) = &expansion.parent else {
                continue;
            };
            let branch = expansion
                .branch
                .clone()
                .expect("an expansion with a parent has a branch");
            let child_is_over = expansion.child.borrow().is_over();
            let (parent_depth, parent_id) = {
                let parent = parent.borrow();
                (parent.depth(), parent.id())
            };
            let (_, pending) = queue.entry_or_insert_with(parent_depth, parent_id, || {
                (parent.clone(), PendingUpdates::new())
            });
            pending.branches_with_updated_value.insert(branch.clone());
            pending
                .branches_with_updated_best_branch
                .insert(branch.clone());
            if child_is_over {
                pending.branches_with_updated_over.insert(branch.clone());
            }
            if self.depth_extended_index {
                pending.branches_with_updated_index.insert(branch);
            }
        }

        while let Some((_, (node, pending))) = queue.pop_deepest() {
            let Some(outgoing) = self.apply_on_node(&node, &pending) else {
                continue;
            };
            let parents = node.borrow().tree_node().parents_upgraded();
            for (grandparent, branch) in parents {
                let (depth, id) = {
                    let grandparent = grandparent.borrow();
                    (grandparent.depth(), grandparent.id())
                };
                let (_, pending) = queue.entry_or_insert_with(depth, id, || {
                    (grandparent.clone(), PendingUpdates::new())
                });
                pending.merge_from_child(&branch, &outgoing);
            }
        }
    }

    /// Applies one node's accumulated updates: terminal resolution first,
    /// then the minimax value, then the principal line. A node that newly
    /// became over notifies its parents in every dimension.
    fn apply_on_node<S: State>(
        &self,
        node: &NodeRef<S>,
        pending: &PendingUpdates<S>,
    ) -> Option<UpdatesFromOneNode> {
        let mut node_mut = node.borrow_mut();

        let newly_over = node_mut.update_over(&pending.branches_with_updated_over);
        let (value_changed, line_changed_by_value) =
            node_mut.minmax_update(&pending.branches_with_updated_value);
        let line_changed_by_children =
            node_mut.update_best_branch_sequence(&pending.branches_with_updated_best_branch);

        let mut index_changed = false;
        if self.depth_extended_index {
            index_changed = node_mut.recompute_max_depth_descendants();
        }
        drop(node_mut);

        let best_branch_changed = line_changed_by_value || line_changed_by_children;
        let outgoing = UpdatesFromOneNode {
            newly_over,
            value_changed: value_changed || newly_over,
            best_branch_changed: best_branch_changed || newly_over,
            index_changed: index_changed
                || (self.depth_extended_index && (value_changed || best_branch_changed)),
        };
        if outgoing.is_empty() {
            None
        } else {
            Some(outgoing)
        }
    }
}
