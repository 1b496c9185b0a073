//! The Sequool selector: pick a depth, then open the node with the best
//! exploration index at (or below) that depth, optionally recursing into
//! already-opened picks.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::nodes::algorithm_node::NodeRef;
use crate::nodes::traversal::descendants_not_over;
use crate::nodes::tree_node::TreeDepth;
use crate::selectors::opening_instructions::{
    instructions_to_open_all_branches, OpeningInstructions, OpeningInstructor,
};
use crate::selectors::zipf::{zipf_pick_deterministic, zipf_pick_random};
use crate::state::State;
use crate::tree_manager::expansion::TreeExpansions;
use crate::trees::descendants::Descendants;
use crate::trees::tree::Tree;

/// Which nodes are candidates once a depth is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CandidateMode {
    /// All not-yet-opened nodes at the picked depth or above it.
    #[default]
    LesserInDescendants,
    /// Only the not-yet-opened nodes exactly at the picked depth.
    OnlyAtDepth,
    /// Subtree traversal below the current node, capped at the picked
    /// depth.
    LesserInSubtree,
}

/// The pluggable depth selection of the first phase.
pub enum DepthPicker {
    /// Zipf-weighted deterministic pick of the least-visited eligible
    /// depth. Visits start at 1 on first discovery and grow on pick.
    StaticNotOpened {
        count_visits: BTreeMap<TreeDepth, f64>,
    },
    /// Zipf-weighted random depth offset in `1..=max_depth_of_descendants`
    /// (needs depth-extended index data).
    RandomAll,
}

impl DepthPicker {
    fn register_depth(&mut self, depth: TreeDepth) {
        if let DepthPicker::StaticNotOpened { count_visits } = self {
            // a fresh depth starts at one visit: zero would win every
            // zipf pick unconditionally
            count_visits.entry(depth).or_insert(1.0);
        }
    }

    fn select_depth<S: State>(
        &mut self,
        from_node: &NodeRef<S>,
        all_nodes_not_opened: &Descendants<S>,
        rng: &mut StdRng,
    ) -> TreeDepth {
        match self {
            DepthPicker::StaticNotOpened { count_visits } => {
                let eligible: Vec<(TreeDepth, f64)> = count_visits
                    .iter()
                    .filter(|(depth, _)| all_nodes_not_opened.has_depth(**depth))
                    .map(|(depth, visits)| (*depth, *visits))
                    .collect();
                let Some(picked) = zipf_pick_deterministic(&eligible, true) else {
                    return from_node.borrow().depth();
                };
                *count_visits.get_mut(&picked).expect("picked a known depth") += 1.0;
                picked
            }
            DepthPicker::RandomAll => {
                let from_depth = from_node.borrow().depth();
                let max_descendants_depth = from_node
                    .borrow()
                    .exploration()
                    .and_then(|data| data.max_depth_descendants)
                    .unwrap_or(0);
                if max_descendants_depth == 0 {
                    return from_depth;
                }
                let offsets: Vec<usize> = (1..=max_descendants_depth).collect();
                let offset = zipf_pick_random(&offsets, rng).expect("non-empty offsets");
                from_depth + offset
            }
        }
    }
}

/// Candidate minimizing `(exploration index, depth)` lexicographically.
/// Candidates with an unset index are skipped unless every index is unset,
/// in which case the first candidate wins.
pub fn best_node_from_candidates<S: State>(candidates: &[NodeRef<S>]) -> Option<NodeRef<S>> {
    let mut best = candidates.first()?.clone();
    let mut best_value = {
        let node = best.borrow();
        (node.exploration().and_then(|d| d.index()), node.depth())
    };

    for node in candidates {
        let value = {
            let node = node.borrow();
            (node.exploration().and_then(|d| d.index()), node.depth())
        };
        if let (Some(index), depth) = value {
            let replace = match best_value {
                (None, _) => true,
                (Some(best_index), best_depth) => {
                    (index, depth) < (best_index, best_depth)
                }
            };
            if replace {
                best = node.clone();
                best_value = (Some(index), depth);
            }
        }
    }
    Some(best)
}

pub struct Sequool<S: State> {
    opening_instructor: OpeningInstructor,
    all_nodes_not_opened: Descendants<S>,
    recursive: bool,
    depth_picker: DepthPicker,
    candidate_mode: CandidateMode,
}

impl<S: State> Sequool<S> {
    pub fn new(
        opening_instructor: OpeningInstructor,
        recursive: bool,
        depth_picker: DepthPicker,
        candidate_mode: CandidateMode,
    ) -> Self {
        Sequool {
            opening_instructor,
            all_nodes_not_opened: Descendants::new(),
            recursive,
            depth_picker,
            candidate_mode,
        }
    }

    pub fn choose(
        &mut self,
        tree: &Tree<S>,
        latest_expansions: &TreeExpansions<S>,
        rng: &mut StdRng,
    ) -> OpeningInstructions<S> {
        for expansion in latest_expansions.iter() {
            if expansion.is_new {
                self.all_nodes_not_opened.add(&expansion.child);
            }
            self.depth_picker
                .register_depth(expansion.child.borrow().depth());
        }

        self.choose_recur(tree.root().clone(), rng)
    }

    fn choose_recur(&mut self, from_node: NodeRef<S>, rng: &mut StdRng) -> OpeningInstructions<S> {
        let depth_picked =
            self.depth_picker
                .select_depth(&from_node, &self.all_nodes_not_opened, rng);

        let candidates: Vec<NodeRef<S>> = match self.candidate_mode {
            CandidateMode::LesserInDescendants => {
                let depths: Vec<TreeDepth> = self
                    .all_nodes_not_opened
                    .depths()
                    .filter(|depth| *depth <= depth_picked)
                    .collect();
                depths
                    .into_iter()
                    .flat_map(|depth| self.all_nodes_not_opened.nodes_at(depth))
                    .collect()
            }
            CandidateMode::OnlyAtDepth => self.all_nodes_not_opened.nodes_at(depth_picked),
            CandidateMode::LesserInSubtree => {
                let from_depth = from_node.borrow().depth();
                // the entry node itself only stays a candidate while it has
                // unopened branches, otherwise the recursion could not
                // descend
                descendants_not_over(&from_node, depth_picked.saturating_sub(from_depth))
                    .into_iter()
                    .filter(|node| {
                        !(std::rc::Rc::ptr_eq(node, &from_node)
                            && node.borrow().tree_node().all_branches_generated())
                    })
                    .collect()
            }
        };

        let Some(best_node) = best_node_from_candidates(&candidates) else {
            return OpeningInstructions::new();
        };

        if self.recursive
            && best_node.borrow().tree_node().all_branches_generated()
            && !std::rc::Rc::ptr_eq(&best_node, &from_node)
        {
            return self.choose_recur(best_node, rng);
        }

        if self.all_nodes_not_opened.contains_node(&best_node) {
            self.all_nodes_not_opened.remove(&best_node);
        }

        let branches = self.opening_instructor.all_branches_to_open(&best_node);
        instructions_to_open_all_branches(branches, &best_node)
    }
}
