//! Budget enforcement and progress reporting.

use crate::search::config::StoppingCriterionConfig;
use crate::selectors::opening_instructions::OpeningInstructions;
use crate::selectors::NodeSelector;
use crate::state::State;
use crate::trees::tree::Tree;

pub enum ProgressMonitor {
    BranchCount { limit: u64 },
    Depth { limit: usize },
}

impl ProgressMonitor {
    pub fn from_config(config: StoppingCriterionConfig) -> Self {
        match config {
            StoppingCriterionConfig::BranchCountLimit { limit } => {
                ProgressMonitor::BranchCount { limit }
            }
            StoppingCriterionConfig::DepthLimit { limit } => ProgressMonitor::Depth { limit },
        }
    }

    /// Whether the search loop keeps going: always stops on a resolved
    /// root, otherwise checks the budget.
    pub fn should_continue<S: State>(&self, tree: &Tree<S>, selector: &NodeSelector<S>) -> bool {
        if tree.root().borrow().is_over() {
            return false;
        }
        match self {
            ProgressMonitor::BranchCount { limit } => tree.branch_count < *limit,
            ProgressMonitor::Depth { limit } => selector
                .current_depth_to_expand()
                .map_or(false, |depth| depth < *limit),
        }
    }

    /// Caps an opening batch to the remaining branch budget, keeping the
    /// tail (highest priority) entries.
    pub fn trim<S: State>(
        &self,
        mut instructions: OpeningInstructions<S>,
        tree: &Tree<S>,
    ) -> OpeningInstructions<S> {
        match self {
            ProgressMonitor::BranchCount { limit } => {
                let remaining = limit.saturating_sub(tree.branch_count) as usize;
                let mut trimmed = OpeningInstructions::new();
                instructions.pop_items(remaining, &mut trimmed);
                trimmed
            }
            ProgressMonitor::Depth { .. } => instructions,
        }
    }

    pub fn progress_percent<S: State>(
        &self,
        tree: &Tree<S>,
        selector: &NodeSelector<S>,
    ) -> u8 {
        let percent = match self {
            ProgressMonitor::BranchCount { limit } => {
                if *limit == 0 {
                    100
                } else {
                    (tree.branch_count * 100 / limit) as u64
                }
            }
            ProgressMonitor::Depth { limit } => {
                let depth = selector.current_depth_to_expand().unwrap_or(0) as u64;
                if *limit == 0 {
                    100
                } else {
                    depth * 100 / *limit as u64
                }
            }
        };
        percent.min(100) as u8
    }

    pub fn progress_string<S: State>(&self, tree: &Tree<S>, selector: &NodeSelector<S>) -> String {
        match self {
            ProgressMonitor::BranchCount { limit } => format!(
                "========= tree branch counting: {} out of {} | {}%",
                tree.branch_count,
                limit,
                self.progress_percent(tree, selector)
            ),
            ProgressMonitor::Depth { limit } => format!(
                "========= tree branch counting: {} | Depth: {} out of {}",
                tree.branch_count,
                selector.current_depth_to_expand().unwrap_or(0),
                limit
            ),
        }
    }

    /// Push-based progress reporting toward an optional host callback.
    pub fn notify<S: State>(
        &self,
        tree: &Tree<S>,
        selector: &NodeSelector<S>,
        callback: Option<&dyn Fn(u8)>,
    ) {
        if let Some(callback) = callback {
            callback(self.progress_percent(tree, selector));
        }
    }
}
