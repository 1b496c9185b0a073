//! Breadth-first collection of descendants, used by the subtree candidate
//! mode of the Sequool selector.

use std::collections::HashSet;
use std::rc::Rc;

use crate::nodes::algorithm_node::NodeRef;
use crate::state::State;

/// Descendants of `from` (itself included when it qualifies) that are not
/// resolved terminal, visiting at most `max_depth` generations below
/// `from`. Order is deterministic: breadth first, children in branch
/// insertion order, each node reported once.
pub fn descendants_not_over<S: State>(from: &NodeRef<S>, max_depth: usize) -> Vec<NodeRef<S>> {
    let mut collected: Vec<NodeRef<S>> = Vec::new();
    let mut seen: HashSet<*const std::cell::RefCell<crate::nodes::AlgorithmNode<S>>> =
        HashSet::new();

    if from.borrow().tree_node().branches_children().is_empty() {
        return vec![from.clone()];
    }
    if !from.borrow().is_over() {
        seen.insert(Rc::as_ptr(from));
        collected.push(from.clone());
    }

    let mut generation: Vec<NodeRef<S>> = from
        .borrow()
        .tree_node()
        .branches_children()
        .values()
        .cloned()
        .collect();
    let mut depth = 1;

    while !generation.is_empty() && depth <= max_depth {
        let mut next_generation: Vec<NodeRef<S>> = Vec::new();
        for node in generation {
            if seen.insert(Rc::as_ptr(&node)) {
                if !node.borrow().is_over() {
                    collected.push(node.clone());
                }
                for child in node.borrow().tree_node().branches_children().values() {
                    next_generation.push(child.clone());
                }
            }
        }
        generation = next_generation;
        depth += 1;
    }

    collected
}
