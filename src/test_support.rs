//! Table-driven fake game used by the unit tests: states are positions in
//! a hand-written DAG, branches are child ordinals, values come from a
//! lookup table.

use std::collections::HashMap;
use std::rc::Rc;

use crate::errors::TransitionError;
use crate::nodes::algorithm_node::{AlgorithmNode, NodeRef};
use crate::nodes::tree_node::NodeId;
use crate::state::{BatchEvaluator, EvalItem, OverEvent, State, TerminalDetector, Turn};

#[derive(Clone)]
pub struct TableGame {
    pub node_id: u32,
    pub children: Rc<HashMap<u32, Vec<u32>>>,
    pub turn: Turn,
    pub alternate_turns: bool,
}

impl TableGame {
    pub fn new(edges: &[(u32, &[u32])], alternate_turns: bool) -> Self {
        let children: HashMap<u32, Vec<u32>> = edges
            .iter()
            .map(|(parent, kids)| (*parent, kids.to_vec()))
            .collect();
        TableGame {
            node_id: 0,
            children: Rc::new(children),
            turn: Turn::White,
            alternate_turns,
        }
    }

    fn children_here(&self) -> &[u32] {
        self.children
            .get(&self.node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl State for TableGame {
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

/// Evaluator reading white values from a per-tag table.
pub struct TableEvaluator {
    pub values: HashMap<u32, f64>,
}

impl TableEvaluator {
    pub fn new(values: &[(u32, f64)]) -> Self {
        TableEvaluator {
            values: values.iter().copied().collect(),
        }
    }
}

impl BatchEvaluator<TableGame> for TableEvaluator {
    fn evaluate_batch(&self, items: &[EvalItem<'_, TableGame>]) -> Vec<f64> {
        items
            .iter()
            .map(|item| *self.values.get(&item.state.tag()).unwrap_or(&0.0))
            .collect()
    }
}

/// Detector resolving the configured tags as terminal.
pub struct TableDetector {
    pub overs: HashMap<u32, (OverEvent, f64)>,
}

impl TableDetector {
    pub fn never_over() -> Self {
        TableDetector {
            overs: HashMap::new(),
        }
    }

    pub fn with(overs: Vec<(u32, OverEvent, f64)>) -> Self {
        TableDetector {
            overs: overs
                .into_iter()
                .map(|(tag, event, value)| (tag, (event, value)))
                .collect(),
        }
    }
}

impl TerminalDetector<TableGame> for TableDetector {
    fn check_terminal(&self, state: &TableGame) -> (Option<OverEvent>, Option<f64>) {
        match self.overs.get(&state.tag()) {
            Some((event, value)) => (Some(event.clone()), Some(*value)),
            None => (None, None),
        }
    }
}

/// A bare node for tests that wire trees by hand.
pub fn make_node(id: NodeId, depth: usize, state: TableGame) -> NodeRef<TableGame> {
    AlgorithmNode::new(id, depth, state, None, None).into_ref()
}

/// A bare node positioned at `node_id` in the table.
pub fn make_node_at(
    id: NodeId,
    depth: usize,
    node_id: u32,
    game: &TableGame,
    turn: Turn,
) -> NodeRef<TableGame> {
    let mut state = game.clone();
    state.node_id = node_id;
    state.turn = turn;
    make_node(id, depth, state)
}

/// Links `child` under `parent` through `branch`, in both directions.
pub fn link(parent: &NodeRef<TableGame>, branch: usize, child: &NodeRef<TableGame>) {
    child.borrow_mut().tree_node_mut().add_parent(branch, parent);
    parent
        .borrow_mut()
        .tree_node_mut()
        .insert_child(branch, child.clone());
    if !child.borrow().is_over() {
        parent
            .borrow_mut()
            .evaluation_mut()
            .push_branch_not_over(branch);
    }
}
