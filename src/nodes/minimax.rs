//! Per-node minimax bookkeeping and the backward-update operations.
//!
//! `TreeEvaluation` stores the evaluation side of a node: the direct
//! (leaf evaluator) value, the backed-up minimax value, the principal
//! line, the children sorted by subjective value, the insertion-ordered
//! list of branches not yet resolved terminal, and the terminal event.
//!
//! The sorted table keeps subjective values in ascending order with the
//! WHITE value negated, so the head entry is always the best branch for
//! the side to move.

use indexmap::IndexSet;

use crate::nodes::algorithm_node::AlgorithmNode;
use crate::nodes::tree_node::NodeId;
use crate::state::{OverEvent, State, Turn};
use crate::utils::math::guarded_logit;

const ALMOST_EQUAL_EPSILON: f64 = 0.01;

/// Sort key of one branch in a parent: negated-subjective child value,
/// line-length tie break, child id for total order stability.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchSortValue {
    pub subjective: f64,
    pub line_len: i64,
    pub child_id: NodeId,
}

impl BranchSortValue {
    pub fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.subjective
            .total_cmp(&other.subjective)
            .then_with(|| self.line_len.cmp(&other.line_len))
            .then_with(|| self.child_id.cmp(&other.child_id))
    }

    /// Strict 3-tuple equality.
    pub fn equal(&self, other: &Self) -> bool {
        self.subjective == other.subjective
            && self.line_len == other.line_len
            && self.child_id == other.child_id
    }

    /// First two fields equal, child id ignored.
    pub fn considered_equal(&self, other: &Self) -> bool {
        self.subjective == other.subjective && self.line_len == other.line_len
    }
}

/// Epsilon comparison on the first sort field.
pub fn almost_equal(value_1: f64, value_2: f64) -> bool {
    value_1 > value_2 - ALMOST_EQUAL_EPSILON && value_2 > value_1 - ALMOST_EQUAL_EPSILON
}

/// Equivalence predicates available when collecting the set of best
/// branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HowEqual {
    Equal,
    ConsideredEqual,
    AlmostEqual,
    AlmostEqualLogistic,
}

/// Evaluation of a node as reported to the caller: a resolved terminal
/// outcome with its line, or a floating backed-up value.
pub enum NodeEvaluation<S: State> {
    ForcedOutcome {
        outcome: OverEvent,
        line: Vec<S::Branch>,
    },
    Floating {
        value_white: Option<f64>,
    },
}

// manual impls: the contained types are bounded through `State`, the
// state itself need not be comparable or printable
impl<S: State> Clone for NodeEvaluation<S> {
    fn clone(&self) -> Self {
        match self {
            NodeEvaluation::ForcedOutcome { outcome, line } => NodeEvaluation::ForcedOutcome {
                outcome: outcome.clone(),
                line: line.clone(),
            },
            NodeEvaluation::Floating { value_white } => NodeEvaluation::Floating {
                value_white: *value_white,
            },
        }
    }
}

impl<S: State> PartialEq for NodeEvaluation<S> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                NodeEvaluation::ForcedOutcome { outcome, line },
                NodeEvaluation::ForcedOutcome {
                    outcome: other_outcome,
                    line: other_line,
                },
            ) => outcome == other_outcome && line == other_line,
            (
                NodeEvaluation::Floating { value_white },
                NodeEvaluation::Floating {
                    value_white: other_value,
                },
            ) => value_white == other_value,
            _ => false,
        }
    }
}

impl<S: State> std::fmt::Debug for NodeEvaluation<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeEvaluation::ForcedOutcome { outcome, line } => f
                .debug_struct("ForcedOutcome")
                .field("outcome", outcome)
                .field("line", line)
                .finish(),
            NodeEvaluation::Floating { value_white } => f
                .debug_struct("Floating")
                .field("value_white", value_white)
                .finish(),
        }
    }
}

pub struct TreeEvaluation<S: State> {
    value_white_direct: Option<f64>,
    value_white_minmax: Option<f64>,
    best_branch_sequence: Vec<S::Branch>,
    // ascending by sort value, head is the best branch for the side to move
    branches_sorted_by_value: Vec<(S::Branch, BranchSortValue)>,
    // insertion ordered, iteration order must stay deterministic
    branches_not_over: Vec<S::Branch>,
    over_event: Option<OverEvent>,
}

impl<S: State> TreeEvaluation<S> {
    pub fn new() -> Self {
        TreeEvaluation {
            value_white_direct: None,
            value_white_minmax: None,
            best_branch_sequence: Vec::new(),
            branches_sorted_by_value: Vec::new(),
            branches_not_over: Vec::new(),
            over_event: None,
        }
    }

    pub fn value_white_direct(&self) -> Option<f64> {
        self.value_white_direct
    }

    pub fn value_white_minmax(&self) -> Option<f64> {
        self.value_white_minmax
    }

    /// The best current estimation of the white value of this node.
    pub fn get_value_white(&self) -> f64 {
        self.value_white_minmax
            .expect("queried the value of a node that was never evaluated")
    }

    /// Records the direct evaluation. Written exactly once; the minimax
    /// value starts at the direct value until children report theirs.
    pub fn set_evaluation(&mut self, evaluation: f64) {
        debug_assert!(
            self.value_white_direct.is_none(),
            "direct evaluation must be written exactly once"
        );
        self.value_white_direct = Some(evaluation);
        self.value_white_minmax = Some(evaluation);
    }

    pub(crate) fn set_minmax(&mut self, value: f64) {
        self.value_white_minmax = Some(value);
    }

    pub fn best_branch_sequence(&self) -> &[S::Branch] {
        &self.best_branch_sequence
    }

    pub(crate) fn set_best_branch_sequence(&mut self, sequence: Vec<S::Branch>) {
        self.best_branch_sequence = sequence;
    }

    pub(crate) fn clear_best_branch_sequence(&mut self) {
        self.best_branch_sequence.clear();
    }

    pub fn branches_sorted_by_value(&self) -> &[(S::Branch, BranchSortValue)] {
        &self.branches_sorted_by_value
    }

    /// Head of the sorted table: the current best branch, if any branch
    /// is opened.
    pub fn best_branch(&self) -> Option<&S::Branch> {
        self.branches_sorted_by_value.first().map(|(branch, _)| branch)
    }

    pub fn best_branch_value(&self) -> Option<&BranchSortValue> {
        self.branches_sorted_by_value.first().map(|(_, value)| value)
    }

    pub fn second_best_branch(&self) -> Option<&S::Branch> {
        self.branches_sorted_by_value.get(1).map(|(branch, _)| branch)
    }

    pub fn sort_value_of(&self, branch: &S::Branch) -> Option<&BranchSortValue> {
        self.branches_sorted_by_value
            .iter()
            .find(|(known, _)| known == branch)
            .map(|(_, value)| value)
    }

    pub(crate) fn record_entry(&mut self, branch: S::Branch, value: BranchSortValue) {
        match self
            .branches_sorted_by_value
            .iter_mut()
            .find(|(known, _)| *known == branch)
        {
            Some(entry) => entry.1 = value,
            None => self.branches_sorted_by_value.push((branch, value)),
        }
    }

    pub(crate) fn sort_ascending(&mut self) {
        self.branches_sorted_by_value
            .sort_by(|(_, a), (_, b)| a.cmp(b));
    }

    pub fn branches_not_over(&self) -> &[S::Branch] {
        &self.branches_not_over
    }

    pub(crate) fn push_branch_not_over(&mut self, branch: S::Branch) {
        if !self.branches_not_over.contains(&branch) {
            self.branches_not_over.push(branch);
        }
    }

    pub(crate) fn remove_branch_not_over(&mut self, branch: &S::Branch) {
        if let Some(position) = self.branches_not_over.iter().position(|known| known == branch) {
            self.branches_not_over.remove(position);
        }
    }

    /// Branches not yet resolved terminal, in descending quality order for
    /// the side to move.
    pub fn sort_branches_not_over(&self) -> Vec<S::Branch> {
        self.branches_sorted_by_value
            .iter()
            .filter(|(branch, _)| self.branches_not_over.contains(branch))
            .map(|(branch, _)| branch.clone())
            .collect()
    }

    pub fn over_event(&self) -> Option<&OverEvent> {
        self.over_event.as_ref()
    }

    pub fn is_over(&self) -> bool {
        self.over_event.is_some()
    }

    pub fn is_win(&self) -> bool {
        self.over_event.as_ref().map_or(false, OverEvent::is_win)
    }

    pub fn is_draw(&self) -> bool {
        self.over_event.as_ref().map_or(false, OverEvent::is_draw)
    }

    pub fn is_winner(&self, player: Turn) -> bool {
        self.over_event
            .as_ref()
            .map_or(false, |event| event.is_winner(player))
    }

    /// Terminal transition is monotone: set once, never modified.
    pub(crate) fn become_over(&mut self, event: OverEvent) {
        debug_assert!(self.over_event.is_none(), "over event must never be overwritten");
        self.over_event = Some(event);
    }

    /// All branches whose sort value matches the head under the given
    /// equivalence.
    pub fn best_branches_matching(&self, how_equal: HowEqual) -> Vec<S::Branch> {
        let Some(best_value) = self.best_branch_value().copied() else {
            return Vec::new();
        };
        self.branches_sorted_by_value
            .iter()
            .filter(|(_, value)| match how_equal {
                HowEqual::Equal => value.equal(&best_value),
                HowEqual::ConsideredEqual => value.considered_equal(&best_value),
                HowEqual::AlmostEqual => almost_equal(value.subjective, best_value.subjective),
                HowEqual::AlmostEqualLogistic => almost_equal(
                    guarded_logit(value.subjective * 0.5 + 0.5),
                    guarded_logit(best_value.subjective * 0.5 + 0.5),
                ),
            })
            .map(|(branch, _)| branch.clone())
            .collect()
    }

    pub fn evaluate(&self) -> NodeEvaluation<S> {
        match &self.over_event {
            Some(event) => NodeEvaluation::ForcedOutcome {
                outcome: event.clone(),
                line: self.best_branch_sequence.clone(),
            },
            None => NodeEvaluation::Floating {
                value_white: self.value_white_minmax,
            },
        }
    }

    /// Readable principal line, for logs.
    pub fn description_best_branch_sequence(&self) -> String {
        let mut result = String::new();
        for branch in &self.best_branch_sequence {
            result.push('_');
            result.push_str(&format!("{branch:?}"));
        }
        result
    }

    pub fn dot_description(&self) -> String {
        let value_mm = match self.value_white_minmax {
            Some(v) => format!("{v:.3}"),
            None => "None".to_string(),
        };
        let value_eval = match self.value_white_direct {
            Some(v) => format!("{v:.3}"),
            None => "None".to_string(),
        };
        let over = match &self.over_event {
            Some(event) => event.over_tag(),
            None => "-".to_string(),
        };
        format!(
            "wh_val_mm: {value_mm}\nwh_val_eval: {value_eval}\nbranches*{}\nover: {over}",
            self.description_best_branch_sequence()
        )
    }
}

impl<S: State> Default for TreeEvaluation<S> {
    fn default() -> Self {
        Self::new()
    }
}

// Backward-update operations. They live on the node rather than on the
// evaluation record because every one of them reads the tree wiring
// (children, turn, generation flag) while rewriting the evaluation.
impl<S: State> AlgorithmNode<S> {
    /// White value seen from this node's side to move.
    pub fn subjective_value(&self) -> f64 {
        self.subjective_value_of(self.evaluation().get_value_white())
    }

    /// Converts a white value into the perspective of this node's side to
    /// move: larger is better for the player at this node.
    pub fn subjective_value_of(&self, value_white: f64) -> f64 {
        match self.turn() {
            Turn::White => value_white,
            Turn::Black => -value_white,
        }
    }

    /// Recomputes the sort 3-tuple of the child at `branch` and writes it
    /// into the sorted table. With `over_convention` ties break toward
    /// shorter lines (reach the settled outcome fast); otherwise longer
    /// lines rank better.
    pub fn record_sort_value(&mut self, branch: &S::Branch, over_convention: bool) {
        let child = self
            .tree_node()
            .child(branch)
            .cloned()
            .expect("sort value recorded for an unopened branch");
        let (child_value, child_line_len, child_id) = {
            let child = child.borrow();
            (
                child.evaluation().get_value_white(),
                child.evaluation().best_branch_sequence().len() as i64,
                child.id(),
            )
        };
        let subjective = match self.turn() {
            Turn::White => -child_value,
            Turn::Black => child_value,
        };
        let line_len = if over_convention {
            -child_line_len
        } else {
            child_line_len
        };
        self.evaluation_mut().record_entry(
            branch.clone(),
            BranchSortValue {
                subjective,
                line_len,
                child_id,
            },
        );
    }

    /// Re-records the sort value of every branch in `branches`, then
    /// restores the ascending order of the table.
    pub fn update_branches_values(&mut self, branches: &IndexSet<S::Branch>) {
        let over_convention = self.is_over();
        for branch in branches {
            self.record_sort_value(branch, over_convention);
        }
        self.evaluation_mut().sort_ascending();
    }

    /// Backs the minimax value up from the head child. While branches are
    /// still unopened the direct evaluation acts as a floor (WHITE) or
    /// ceiling (BLACK).
    pub fn update_value_minmax(&mut self) {
        let best_branch = self
            .evaluation()
            .best_branch()
            .cloned()
            .expect("minmax update without any opened branch");
        let best_child = self
            .tree_node()
            .child(&best_branch)
            .cloned()
            .expect("best branch has a child");
        let best_value = best_child.borrow().evaluation().get_value_white();

        let new_value = if self.tree_node().all_branches_generated() {
            best_value
        } else {
            let direct = self
                .evaluation()
                .value_white_direct()
                .expect("node with open branches was never evaluated");
            match self.turn() {
                Turn::White => best_value.max(direct),
                Turn::Black => best_value.min(direct),
            }
        };
        self.evaluation_mut().set_minmax(new_value);
    }

    /// Extends the principal line through the head branch when that child
    /// reported a new line of its own. Returns whether the sequence was
    /// replaced.
    pub fn update_best_branch_sequence(&mut self, updated: &IndexSet<S::Branch>) -> bool {
        let Some(head) = self.evaluation().best_branch_sequence().first().cloned() else {
            return false;
        };
        if !updated.contains(&head) {
            return false;
        }
        let Some(child) = self.tree_node().child(&head).cloned() else {
            return false;
        };
        let mut sequence = vec![head];
        sequence.extend_from_slice(child.borrow().evaluation().best_branch_sequence());
        self.evaluation_mut().set_best_branch_sequence(sequence);
        true
    }

    /// Whether `value_white` is at least as good, subjectively, as this
    /// node's own direct evaluation.
    pub fn is_value_subjectively_better_than_direct(&self, value_white: f64) -> bool {
        let direct = self
            .evaluation()
            .value_white_direct()
            .expect("comparison against a missing direct evaluation");
        self.subjective_value_of(value_white) >= self.subjective_value_of(direct)
    }

    /// Adopts one of the strictly tied best branches as the new head of
    /// the principal line. With strict 3-tuple equality the tie set has
    /// exactly one element.
    pub fn choose_new_best_line(&mut self) {
        let best_branches = self.evaluation().best_branches_matching(HowEqual::Equal);
        debug_assert_eq!(best_branches.len(), 1);
        let branch = best_branches
            .into_iter()
            .next()
            .expect("a best branch exists when choosing a new line");
        let child = self
            .tree_node()
            .child(&branch)
            .cloned()
            .expect("best branch has a child");
        let mut sequence = vec![branch];
        sequence.extend_from_slice(child.borrow().evaluation().best_branch_sequence());
        debug_assert!(!sequence.is_empty());
        self.evaluation_mut().set_best_branch_sequence(sequence);
    }

    /// Switches this node to terminal: every child is re-ranked under the
    /// shorter-line-first convention and the head child's over event is
    /// copied over.
    pub fn becoming_over_from_children(&mut self) {
        debug_assert!(!self.is_over());
        let branches: Vec<S::Branch> = self
            .tree_node()
            .branches_children()
            .keys()
            .cloned()
            .collect();
        for branch in &branches {
            self.record_sort_value(branch, true);
        }
        self.evaluation_mut().sort_ascending();

        let best_branch = self
            .evaluation()
            .best_branch()
            .cloned()
            .expect("a node becoming over has at least one opened branch");
        let best_child = self
            .tree_node()
            .child(&best_branch)
            .cloned()
            .expect("best branch has a child");
        let event = best_child
            .borrow()
            .evaluation()
            .over_event()
            .cloned()
            .expect("the head child of a node becoming over is terminal");
        self.evaluation_mut().become_over(event);
    }

    /// Processes terminal notifications from children. Two ways for this
    /// node to become over: a terminal child wins for the side to move
    /// here, or every branch is generated and resolved (forced outcome).
    /// Returns whether the node newly became over.
    pub fn update_over(&mut self, branches_with_updated_over: &IndexSet<S::Branch>) -> bool {
        let mut is_newly_over = false;

        for branch in branches_with_updated_over {
            let Some(child) = self.tree_node().child(branch).cloned() else {
                continue;
            };
            debug_assert!(child.borrow().is_over());
            self.evaluation_mut().remove_branch_not_over(branch);

            if !self.is_over() {
                let child_wins_here = child.borrow().evaluation().is_winner(self.turn());
                if child_wins_here {
                    self.becoming_over_from_children();
                    is_newly_over = true;
                }
            }
        }

        if !self.is_over()
            && self.evaluation().branches_not_over().is_empty()
            && self.tree_node().all_branches_generated()
        {
            self.becoming_over_from_children();
            is_newly_over = true;
        }

        is_newly_over
    }

    /// Applies value notifications from children: re-rank, back the value
    /// up, and maintain the principal line. Returns
    /// `(value_changed, best_line_changed)`.
    pub fn minmax_update(
        &mut self,
        branches_with_updated_value: &IndexSet<S::Branch>,
    ) -> (bool, bool) {
        if self.evaluation().branches_sorted_by_value().is_empty()
            && branches_with_updated_value.is_empty()
        {
            return (false, false);
        }

        let value_before = self.evaluation().get_value_white();
        let best_branch_before = self.evaluation().best_branch().cloned();

        self.update_branches_values(branches_with_updated_value);
        self.update_value_minmax();

        let value_after = self.evaluation().get_value_white();
        let has_value_changed = value_before != value_after;

        // The previous head may have lost its spot after the re-sort; the
        // comparison uses the full sort tuples, not just the raw values.
        let previous_best_dethroned = match &best_branch_before {
            None => true,
            Some(branch) => {
                let updated_previous_best = self.evaluation().sort_value_of(branch).copied();
                let best_after = self.evaluation().best_branch_value().copied();
                match (updated_previous_best, best_after) {
                    (Some(previous), Some(best)) => !previous.equal(&best),
                    _ => true,
                }
            }
        };

        let sequence_before = self.evaluation().best_branch_sequence().to_vec();

        if self.tree_node().all_branches_generated() {
            if previous_best_dethroned {
                self.choose_new_best_line();
            }
        } else {
            // With unopened branches left, the head child only leads the
            // line when it beats this node's own direct evaluation.
            let head = self
                .evaluation()
                .best_branch()
                .cloned()
                .expect("sorted table is non-empty here");
            let head_child = self
                .tree_node()
                .child(&head)
                .cloned()
                .expect("head branch has a child");
            let head_value = head_child.borrow().evaluation().get_value_white();
            if self.is_value_subjectively_better_than_direct(head_value) {
                let mut sequence = vec![head];
                sequence.extend_from_slice(head_child.borrow().evaluation().best_branch_sequence());
                self.evaluation_mut().set_best_branch_sequence(sequence);
            } else {
                self.evaluation_mut().clear_best_branch_sequence();
            }
        }

        let has_sequence_changed = sequence_before != *self.evaluation().best_branch_sequence();
        (has_value_changed, has_sequence_changed)
    }

    /// Refreshes the depth-extended counter from the children. Returns
    /// whether the stored value changed. No-op on nodes without
    /// depth-extended index data.
    pub fn recompute_max_depth_descendants(&mut self) -> bool {
        let new_value = self
            .tree_node()
            .branches_children()
            .values()
            .map(|child| {
                child
                    .borrow()
                    .exploration()
                    .and_then(|data| data.max_depth_descendants)
                    .unwrap_or(0)
                    + 1
            })
            .max()
            .unwrap_or(0);

        match self.exploration_mut() {
            Some(data) => match data.max_depth_descendants {
                Some(old) if old == new_value => false,
                Some(_) => {
                    data.max_depth_descendants = Some(new_value);
                    true
                }
                None => false,
            },
            None => false,
        }
    }
}
