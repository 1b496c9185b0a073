//! Bridge to the external direct evaluator: terminal detection at enqueue
//! time, batched evaluation of the rest at drain time.

use std::rc::Rc;

use crate::errors::SearchError;
use crate::nodes::algorithm_node::NodeRef;
use crate::state::{BatchEvaluator, EvalItem, State, TerminalDetector};

/// Near-1 discount applied per depth to non-terminal evaluations; breaks
/// ties between otherwise equal lines of different lengths.
pub const DISCOUNT: f64 = 0.99999999;

/// Nodes queued for evaluation, split by terminal status.
pub struct EvaluationQueries<S: State> {
    pub terminal_nodes: Vec<NodeRef<S>>,
    pub nonterminal_nodes: Vec<NodeRef<S>>,
}

impl<S: State> EvaluationQueries<S> {
    pub fn new() -> Self {
        EvaluationQueries {
            terminal_nodes: Vec::new(),
            nonterminal_nodes: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.terminal_nodes.clear();
        self.nonterminal_nodes.clear();
    }
}

impl<S: State> Default for EvaluationQueries<S> {
    fn default() -> Self {
        Self::new()
    }
}

pub struct NodeDirectEvaluator<S: State> {
    detector: Rc<dyn TerminalDetector<S>>,
    evaluator: Rc<dyn BatchEvaluator<S>>,
}

impl<S: State> NodeDirectEvaluator<S> {
    pub fn new(detector: Rc<dyn TerminalDetector<S>>, evaluator: Rc<dyn BatchEvaluator<S>>) -> Self {
        NodeDirectEvaluator { detector, evaluator }
    }

    /// Queues a freshly created node. Terminal states are resolved on the
    /// spot: their over event and authoritative evaluation are written
    /// immediately, so by drain time every queued node's terminal status
    /// is known.
    pub fn enqueue(
        &self,
        node: &NodeRef<S>,
        queries: &mut EvaluationQueries<S>,
    ) -> Result<(), SearchError> {
        debug_assert!(
            node.borrow().evaluation().value_white_direct().is_none(),
            "a node is evaluated exactly once"
        );
        let (over_event, evaluation) = self.detector.check_terminal(node.borrow().state());
        match over_event {
            Some(over_event) => {
                let evaluation = evaluation.ok_or(SearchError::UnresolvableTerminal)?;
                {
                    let mut node = node.borrow_mut();
                    node.evaluation_mut().become_over(over_event);
                    node.evaluation_mut().set_evaluation(evaluation);
                }
                queries.terminal_nodes.push(node.clone());
            }
            None => queries.nonterminal_nodes.push(node.clone()),
        }
        Ok(())
    }

    /// Evaluates every queued non-terminal node in one external batch and
    /// writes the depth-discounted values. Clears the queries.
    pub fn drain(&self, queries: &mut EvaluationQueries<S>) -> Result<(), SearchError> {
        if !queries.nonterminal_nodes.is_empty() {
            let borrows: Vec<_> = queries
                .nonterminal_nodes
                .iter()
                .map(|node| node.borrow())
                .collect();
            let items: Vec<EvalItem<'_, S>> = borrows
                .iter()
                .map(|node| EvalItem {
                    state: node.state(),
                    representation: node.representation(),
                })
                .collect();
            let values = self.evaluator.evaluate_batch(&items);
            if values.len() != items.len() {
                return Err(SearchError::EvaluatorFailure {
                    expected: items.len(),
                    got: values.len(),
                });
            }
            drop(items);
            drop(borrows);

            for (node, raw) in queries.nonterminal_nodes.iter().zip(values) {
                let depth = node.borrow().depth();
                let processed = (1.0 / DISCOUNT).powi(depth as i32) * raw;
                node.borrow_mut().evaluation_mut().set_evaluation(processed);
            }
        }
        queries.clear();
        Ok(())
    }
}
