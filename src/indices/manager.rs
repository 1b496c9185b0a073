//! Exploration index computation: three interchangeable priority
//! functions annotating every node with a "smaller is better" index, kept
//! consistent across the DAG's multiple parents by min-merging.

use std::rc::Rc;

use crate::errors::SearchError;
use crate::indices::index_data::{IndexComputation, IndexVariantData};
use crate::nodes::algorithm_node::NodeRef;
use crate::state::{State, Turn};
use crate::trees::tree::Tree;
use crate::utils::interval::Interval;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexManager {
    MinGlobalChange,
    MinLocalChange,
    RecurZipf,
}

impl IndexManager {
    pub fn from_computation(computation: IndexComputation) -> Self {
        match computation {
            IndexComputation::MinGlobalChange => IndexManager::MinGlobalChange,
            IndexComputation::MinLocalChange => IndexManager::MinLocalChange,
            IndexComputation::RecurZipf => IndexManager::RecurZipf,
        }
    }

    /// Initializes the root annotation: the root is always the easiest
    /// node to be best, index 0.
    pub fn update_root_index<S: State>(&self, root: &NodeRef<S>) -> Result<(), SearchError> {
        let root_value = root.borrow().evaluation().get_value_white();
        let mut root = root.borrow_mut();
        let Some(data) = root.exploration_mut() else {
            return Err(SearchError::InconsistentIndex);
        };
        match (&mut data.variant, self) {
            (
                IndexVariantData::MinGlobal {
                    index,
                    min_path_value,
                    max_path_value,
                },
                IndexManager::MinGlobalChange,
            ) => {
                *index = Some(0.0);
                *min_path_value = Some(root_value);
                *max_path_value = Some(root_value);
            }
            (IndexVariantData::MinLocal { index, interval }, IndexManager::MinLocalChange) => {
                *index = Some(0.0);
                *interval = Some(Interval::unbounded());
            }
            (
                IndexVariantData::RecurZipf {
                    index,
                    zipf_factored_proba,
                },
                IndexManager::RecurZipf,
            ) => {
                *index = Some(0.0);
                *zipf_factored_proba = Some(1.0);
            }
            _ => return Err(SearchError::InconsistentIndex),
        }
        Ok(())
    }

    /// Annotates `child` from `parent`. `child_rank` is the child's
    /// 0-based position in the parent's descending-by-value order. With
    /// several parents the stored annotation keeps the best (minimum)
    /// index across paths.
    pub fn update_node_index<S: State>(
        &self,
        parent: &NodeRef<S>,
        child: &NodeRef<S>,
        child_rank: usize,
        tree: &Tree<S>,
    ) -> Result<(), SearchError> {
        match self {
            IndexManager::MinGlobalChange => self.update_min_global(parent, child),
            IndexManager::RecurZipf => self.update_recur_zipf(parent, child, child_rank, tree),
            IndexManager::MinLocalChange => self.update_min_local(parent, child),
        }
    }

    fn update_min_global<S: State>(
        &self,
        parent: &NodeRef<S>,
        child: &NodeRef<S>,
    ) -> Result<(), SearchError> {
        let (parent_min, parent_max) = {
            let parent = parent.borrow();
            match parent.exploration().map(|data| &data.variant) {
                Some(IndexVariantData::MinGlobal {
                    min_path_value: Some(min_path_value),
                    max_path_value: Some(max_path_value),
                    ..
                }) => (*min_path_value, *max_path_value),
                _ => return Err(SearchError::InconsistentIndex),
            }
        };
        let child_value = child.borrow().evaluation().get_value_white();

        let child_min_path = child_value.min(parent_min);
        let child_max_path = child_value.max(parent_max);
        // half the spread of values along the path: how much a uniform
        // perturbation must move them for this node to become best
        let child_index = (child_max_path - child_min_path).abs() / 2.0;

        let mut child = child.borrow_mut();
        let Some(data) = child.exploration_mut() else {
            return Err(SearchError::InconsistentIndex);
        };
        match &mut data.variant {
            IndexVariantData::MinGlobal {
                index,
                min_path_value,
                max_path_value,
            } => match index {
                None => {
                    *index = Some(child_index);
                    *min_path_value = Some(child_min_path);
                    *max_path_value = Some(child_max_path);
                }
                Some(old_index) => {
                    // multi-parent merge: keep the easiest path; the path
                    // bounds contract rather than widen
                    *index = Some(old_index.min(child_index));
                    *max_path_value =
                        Some(child_max_path.min(max_path_value.expect("set with index")));
                    *min_path_value =
                        Some(child_min_path.max(min_path_value.expect("set with index")));
                }
            },
            _ => return Err(SearchError::InconsistentIndex),
        }
        Ok(())
    }

    fn update_recur_zipf<S: State>(
        &self,
        parent: &NodeRef<S>,
        child: &NodeRef<S>,
        child_rank: usize,
        tree: &Tree<S>,
    ) -> Result<(), SearchError> {
        let parent_zipf_factored = {
            let parent = parent.borrow();
            match parent.exploration().map(|data| &data.variant) {
                Some(IndexVariantData::RecurZipf {
                    zipf_factored_proba: Some(zipf_factored_proba),
                    ..
                }) => *zipf_factored_proba,
                _ => return Err(SearchError::InconsistentIndex),
            }
        };

        let child_zipf_proba = 1.0 / (child_rank as f64 + 1.0);
        let child_zipf_factored = child_zipf_proba * parent_zipf_factored;
        let inverse_depth = 1.0 / (tree.node_depth(child) as f64 + 1.0);
        // negated so that likelier-and-shallower means smaller index
        let child_index = -(child_zipf_factored * inverse_depth);

        let mut child = child.borrow_mut();
        let Some(data) = child.exploration_mut() else {
            return Err(SearchError::InconsistentIndex);
        };
        match &mut data.variant {
            IndexVariantData::RecurZipf {
                index,
                zipf_factored_proba,
            } => match index {
                None => {
                    *index = Some(child_index);
                    *zipf_factored_proba = Some(child_zipf_factored);
                }
                Some(old_index) => {
                    *index = Some(old_index.min(child_index));
                    *zipf_factored_proba = Some(
                        zipf_factored_proba
                            .expect("set with index")
                            .min(child_zipf_factored),
                    );
                }
            },
            _ => return Err(SearchError::InconsistentIndex),
        }
        Ok(())
    }

    fn update_min_local<S: State>(
        &self,
        parent: &NodeRef<S>,
        child: &NodeRef<S>,
    ) -> Result<(), SearchError> {
        let parent_borrow = parent.borrow();
        let (parent_index, parent_interval) =
            match parent_borrow.exploration().map(|data| &data.variant) {
                Some(IndexVariantData::MinLocal { index, interval }) => (*index, *interval),
                _ => return Err(SearchError::InconsistentIndex),
            };

        if parent_index.is_none() {
            drop(parent_borrow);
            let mut child = child.borrow_mut();
            let Some(data) = child.exploration_mut() else {
                return Err(SearchError::InconsistentIndex);
            };
            match &mut data.variant {
                IndexVariantData::MinLocal { index, .. } => *index = None,
                _ => return Err(SearchError::InconsistentIndex),
            }
            return Ok(());
        }

        let local_index: Option<f64>;
        let inter_level_interval: Option<Interval>;

        if parent_borrow.tree_node().branches_children().len() == 1 {
            // a single opened branch inherits the parent's slack
            local_index = parent_index;
            inter_level_interval = parent_interval;
        } else {
            let turn = parent_borrow.turn();
            let best_branch = parent_borrow
                .evaluation()
                .best_branch()
                .cloned()
                .expect("parent with children has a best branch");
            let second_best_branch = parent_borrow
                .evaluation()
                .second_best_branch()
                .cloned()
                .expect("parent with several children has a second best");
            let best_child = parent_borrow
                .tree_node()
                .child(&best_branch)
                .cloned()
                .expect("best branch has a child");
            let second_best_child = parent_borrow
                .tree_node()
                .child(&second_best_branch)
                .cloned()
                .expect("second best branch has a child");
            drop(parent_borrow);

            let child_is_best = Rc::ptr_eq(child, &best_child);
            let threshold = if child_is_best {
                second_best_child.borrow().evaluation().get_value_white()
            } else {
                best_child.borrow().evaluation().get_value_white()
            };
            let local_interval = match turn {
                Turn::White => Interval::new(threshold, f64::INFINITY),
                Turn::Black => Interval::new(f64::NEG_INFINITY, threshold),
            };

            let parent_interval = parent_interval.expect("interval set with index");
            inter_level_interval = local_interval.intersect(&parent_interval);
            let child_value = child.borrow().evaluation().get_value_white();
            local_index = inter_level_interval
                .as_ref()
                .map(|interval| interval.distance_to(child_value));

            let mut child = child.borrow_mut();
            let Some(data) = child.exploration_mut() else {
                return Err(SearchError::InconsistentIndex);
            };
            return merge_min_local(data, local_index, inter_level_interval);
        }
        drop(parent_borrow);

        let mut child = child.borrow_mut();
        let Some(data) = child.exploration_mut() else {
            return Err(SearchError::InconsistentIndex);
        };
        merge_min_local(data, local_index, inter_level_interval)
    }
}

fn merge_min_local(
    data: &mut crate::indices::index_data::IndexData,
    local_index: Option<f64>,
    inter_level_interval: Option<Interval>,
) -> Result<(), SearchError> {
    match &mut data.variant {
        IndexVariantData::MinLocal { index, interval } => {
            match index {
                None => {
                    *index = local_index;
                    *interval = inter_level_interval;
                }
                Some(old_index) => {
                    if let Some(new_index) = local_index {
                        if new_index < *old_index {
                            *interval = inter_level_interval;
                        }
                        *index = Some(old_index.min(new_index));
                    }
                }
            }
            Ok(())
        }
        _ => Err(SearchError::InconsistentIndex),
    }
}

/// Full-tree index refresh: depths ascending, children of each parent in
/// descending-by-value order so the rank argument matches the sorted
/// table. O(edges) per refresh.
pub fn update_all_indices<S: State>(
    tree: &Tree<S>,
    manager: Option<&IndexManager>,
) -> Result<(), SearchError> {
    let Some(manager) = manager else {
        return Ok(());
    };

    manager.update_root_index(tree.root())?;

    let depths: Vec<_> = tree.descendants.depths().collect();
    for depth in depths {
        for parent in tree.descendants.nodes_at(depth) {
            let ranked_branches: Vec<S::Branch> = parent
                .borrow()
                .evaluation()
                .branches_sorted_by_value()
                .iter()
                .map(|(branch, _)| branch.clone())
                .collect();
            for (child_rank, branch) in ranked_branches.iter().enumerate() {
                let Some(child) = parent.borrow().tree_node().child(branch).cloned() else {
                    continue;
                };
                manager.update_node_index(&parent, &child, child_rank, tree)?;
            }
        }
    }
    Ok(())
}
