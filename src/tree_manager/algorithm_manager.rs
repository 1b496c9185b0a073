//! The algorithm-level tree manager: opens instruction batches, queues the
//! fresh leaves for evaluation, keeps the not-over bookkeeping current and
//! drives backward propagation.

use log::debug;

use crate::errors::SearchError;
use crate::evaluation::{EvaluationQueries, NodeDirectEvaluator};
use crate::selectors::opening_instructions::OpeningInstructions;
use crate::state::State;
use crate::tree_manager::expansion::{record_expansion, TreeExpansions};
use crate::tree_manager::manager::TreeManager;
use crate::trees::tree::Tree;
use crate::updates::scheduler::UpdateScheduler;

pub struct AlgorithmTreeManager<S: State> {
    pub tree_manager: TreeManager<S>,
    evaluator: NodeDirectEvaluator<S>,
    queries: EvaluationQueries<S>,
    scheduler: UpdateScheduler,
}

impl<S: State> AlgorithmTreeManager<S> {
    pub fn new(
        tree_manager: TreeManager<S>,
        evaluator: NodeDirectEvaluator<S>,
        scheduler: UpdateScheduler,
    ) -> Self {
        AlgorithmTreeManager {
            tree_manager,
            evaluator,
            queries: EvaluationQueries::new(),
            scheduler,
        }
    }

    /// Evaluates the root of a fresh tree (terminal detection included).
    pub fn evaluate_root(&mut self, tree: &Tree<S>) -> Result<(), SearchError> {
        self.evaluator.enqueue(tree.root(), &mut self.queries)?;
        self.evaluator.drain(&mut self.queries)
    }

    /// Opens every instruction of the batch in order, evaluates the new
    /// leaves in one drain, then records which opened branches lead to
    /// not-yet-over children.
    pub fn open_instructions(
        &mut self,
        tree: &mut Tree<S>,
        instructions: OpeningInstructions<S>,
    ) -> Result<TreeExpansions<S>, SearchError> {
        let mut expansions = TreeExpansions::new();
        for instruction in instructions.into_values() {
            let expansion = self.tree_manager.open_branch(
                tree,
                &instruction.node_to_open,
                &instruction.branch,
            )?;
            record_expansion(tree, &mut expansions, expansion);
        }
        debug!(
            "opened {} branches ({} new nodes)",
            expansions.len(),
            expansions.with_creation.len()
        );

        for expansion in &expansions.with_creation {
            self.evaluator.enqueue(&expansion.child, &mut self.queries)?;
        }
        self.evaluator.drain(&mut self.queries)?;

        // terminal status of every new child is known only after the
        // drain, hence the late not-over bookkeeping
        for expansion in expansions.iter() {
            let Some(parent) = &expansion.parent else {
                continue;
            };
            if !expansion.child.borrow().is_over() {
                let branch = expansion
                    .branch
                    .clone()
                    .expect("an expansion with a parent has a branch");
                parent
                    .borrow_mut()
                    .evaluation_mut()
                    .push_branch_not_over(branch);
            }
        }

        Ok(expansions)
    }

    /// Backward pass over the freshly expanded part of the DAG.
    pub fn update_backward(&self, expansions: &TreeExpansions<S>) {
        self.scheduler.propagate(expansions);
    }
}
