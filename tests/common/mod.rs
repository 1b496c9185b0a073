//! Shared fixture for the end-to-end scenarios: a table-driven game whose
//! states are positions in a hand-written DAG, plus a lookup evaluator and
//! terminal detector, and the structural invariant checker.

use std::collections::HashMap;
use std::rc::Rc;

use branchwise::errors::TransitionError;
use branchwise::nodes::algorithm_node::NodeRef;
use branchwise::state::{BatchEvaluator, EvalItem, OverEvent, State, TerminalDetector, Turn};
use branchwise::trees::tree::Tree;

#[derive(Clone)]
pub struct FakeGame {
    pub node_id: u32,
    pub children: Rc<HashMap<u32, Vec<u32>>>,
    pub turn: Turn,
    pub alternate_turns: bool,
}

impl FakeGame {
    pub fn new(edges: &[(u32, &[u32])], alternate_turns: bool) -> Self {
        let children: HashMap<u32, Vec<u32>> = edges
            .iter()
            .map(|(parent, kids)| (*parent, kids.to_vec()))
            .collect();
        FakeGame {
            node_id: 0,
            children: Rc::new(children),
            turn: Turn::White,
            alternate_turns,
        }
    }

    /// A complete binary tree of the given depth, nodes numbered
    /// breadth-first from 0.
    pub fn binary_tree(depth: u32) -> Self {
        let internal = 2u32.pow(depth) - 1;
        let edges: Vec<(u32, Vec<u32>)> = (0..internal)
            .map(|i| (i, vec![2 * i + 1, 2 * i + 2]))
            .collect();
        let children: HashMap<u32, Vec<u32>> = edges.into_iter().collect();
        FakeGame {
            node_id: 0,
            children: Rc::new(children),
            turn: Turn::White,
            alternate_turns: false,
        }
    }

    fn children_here(&self) -> &[u32] {
        self.children
            .get(&self.node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl State for FakeGame {
    type Tag = u32;
    type Branch = usize;
    type Modifications = ();
    type Representation = ();

    fn tag(&self) -> u32 {
        self.node_id
    }

    fn turn(&self) -> Turn {
        self.turn
    }

    fn branch_keys(&self) -> Vec<usize> {
        (0..self.children_here().len()).collect()
    }

    fn is_terminal(&self) -> bool {
        self.children_here().is_empty()
    }

    fn branch_name(&self, branch: &usize) -> String {
        match self.children_here().get(*branch) {
            Some(child) => format!("{}->{}", self.node_id, child),
            None => format!("{}->?{}", self.node_id, branch),
        }
    }

    fn copy(&self, _include_history: bool) -> Self {
        self.clone()
    }

    fn step(&mut self, branch: &usize) -> Result<Option<()>, TransitionError> {
        let child = *self
            .children_here()
            .get(*branch)
            .ok_or_else(|| TransitionError(format!("no branch {branch} at {}", self.node_id)))?;
        self.node_id = child;
        if self.alternate_turns {
            self.turn = self.turn.other();
        }
        Ok(None)
    }
}

pub struct LookupEvaluator {
    values: HashMap<u32, f64>,
}

impl LookupEvaluator {
    pub fn new(values: &[(u32, f64)]) -> Self {
        LookupEvaluator {
            values: values.iter().copied().collect(),
        }
    }
}

impl BatchEvaluator<FakeGame> for LookupEvaluator {
    fn evaluate_batch(&self, items: &[EvalItem<'_, FakeGame>]) -> Vec<f64> {
        items
            .iter()
            .map(|item| *self.values.get(&item.state.tag()).unwrap_or(&0.0))
            .collect()
    }
}

pub struct LookupDetector {
    overs: HashMap<u32, (OverEvent, f64)>,
}

impl LookupDetector {
    pub fn never_over() -> Self {
        LookupDetector {
            overs: HashMap::new(),
        }
    }

    pub fn with(overs: Vec<(u32, OverEvent, f64)>) -> Self {
        LookupDetector {
            overs: overs
                .into_iter()
                .map(|(tag, event, value)| (tag, (event, value)))
                .collect(),
        }
    }
}

impl TerminalDetector<FakeGame> for LookupDetector {
    fn check_terminal(&self, state: &FakeGame) -> (Option<OverEvent>, Option<f64>) {
        match self.overs.get(&state.tag()) {
            Some((event, value)) => (Some(event.clone()), Some(*value)),
            None => (None, None),
        }
    }
}

/// Follows the root's best branch sequence and returns the tags of the
/// visited nodes (root excluded).
pub fn tags_along_best_line(tree: &Tree<FakeGame>) -> Vec<u32> {
    let mut tags = Vec::new();
    let sequence = tree
        .root()
        .borrow()
        .evaluation()
        .best_branch_sequence()
        .to_vec();
    let mut current: NodeRef<FakeGame> = tree.root().clone();
    for branch in sequence {
        let child = current
            .borrow()
            .tree_node()
            .child(&branch)
            .cloned()
            .expect("best line follows opened branches");
        tags.push(child.borrow().tag());
        current = child;
    }
    tags
}

/// The universal structural invariants, checked over the whole DAG.
pub fn check_invariants(tree: &Tree<FakeGame>) {
    tree.descendants.check_consistency();

    for depth in tree.descendants.depths().collect::<Vec<_>>() {
        for node in tree.descendants.nodes_at(depth) {
            let node_borrow = node.borrow();

            // parent/child wiring is bidirectional and depths step by one
            for (branch, child) in node_borrow.tree_node().branches_children() {
                assert_eq!(child.borrow().depth(), depth + 1);
                let child_parents = child.borrow().tree_node().parents_upgraded();
                let backlinks: Vec<_> = child_parents
                    .iter()
                    .filter(|(parent, linking_branch)| {
                        Rc::ptr_eq(parent, &node) && linking_branch == branch
                    })
                    .collect();
                assert_eq!(backlinks.len(), 1);
            }

            // a fully generated, fully resolved node carries an over event
            let fully_opened = node_borrow.tree_node().all_branches_generated()
                && node_borrow.tree_node().branches_children().len()
                    == node_borrow.state().branch_keys().len();
            if fully_opened && node_borrow.evaluation().branches_not_over().is_empty() {
                assert!(node_borrow.is_over());
            }

            // the sorted table is ascending and agrees with the line head
            let table = node_borrow.evaluation().branches_sorted_by_value();
            assert!(table
                .windows(2)
                .all(|pair| pair[0].1.cmp(&pair[1].1) != std::cmp::Ordering::Greater));
            if let Some(head) = node_borrow.evaluation().best_branch_sequence().first() {
                assert_eq!(head, node_borrow.evaluation().best_branch().unwrap());
            }
        }
    }
}
