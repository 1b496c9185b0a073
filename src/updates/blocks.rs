//! Update instruction blocks exchanged during backward propagation.

use indexmap::IndexSet;

use crate::state::State;

/// What changed at one node after its pending updates were applied. This
/// is what gets fanned out to every parent.
#[derive(Debug, Clone, Copy)]
pub struct UpdatesFromOneNode {
    pub newly_over: bool,
    pub value_changed: bool,
    pub best_branch_changed: bool,
    pub index_changed: bool,
}

impl UpdatesFromOneNode {
    pub fn is_empty(&self) -> bool {
        !(self.newly_over || self.value_changed || self.best_branch_changed || self.index_changed)
    }
}

/// Accumulated notifications toward one parent, bucketed by the branch
/// that links parent to the notifying child. Sets keep insertion order to
/// stay deterministic.
pub struct PendingUpdates<S: State> {
    pub branches_with_updated_value: IndexSet<S::Branch>,
    pub branches_with_updated_over: IndexSet<S::Branch>,
    pub branches_with_updated_best_branch: IndexSet<S::Branch>,
    pub branches_with_updated_index: IndexSet<S::Branch>,
}

impl<S: State> PendingUpdates<S> {
    pub fn new() -> Self {
        PendingUpdates {
            branches_with_updated_value: IndexSet::new(),
            branches_with_updated_over: IndexSet::new(),
            branches_with_updated_best_branch: IndexSet::new(),
            branches_with_updated_index: IndexSet::new(),
        }
    }

    /// Merges one child's outgoing record under the linking branch.
    pub fn merge_from_child(&mut self, branch: &S::Branch, updates: &UpdatesFromOneNode) {
        if updates.value_changed {
            self.branches_with_updated_value.insert(branch.clone());
        }
        if updates.newly_over {
            self.branches_with_updated_over.insert(branch.clone());
        }
        if updates.best_branch_changed {
            self.branches_with_updated_best_branch.insert(branch.clone());
        }
        if updates.index_changed {
            self.branches_with_updated_index.insert(branch.clone());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.branches_with_updated_value.is_empty()
            && self.branches_with_updated_over.is_empty()
            && self.branches_with_updated_best_branch.is_empty()
            && self.branches_with_updated_index.is_empty()
    }
}

impl<S: State> Default for PendingUpdates<S> {
    fn default() -> Self {
        Self::new()
    }
}
