//! The Uniform selector: sweeps the tree level by level, opening every
//! not-over node of the current depth, best ones last.

use crate::nodes::algorithm_node::NodeRef;
use crate::selectors::opening_instructions::{
    instructions_to_open_all_branches, OpeningInstructions, OpeningInstructor,
};
use crate::state::State;
use crate::trees::tree::Tree;

pub struct Uniform {
    opening_instructor: OpeningInstructor,
    current_depth_to_expand: usize,
}

impl Uniform {
    pub fn new(opening_instructor: OpeningInstructor) -> Self {
        Uniform {
            opening_instructor,
            current_depth_to_expand: 0,
        }
    }

    pub fn current_depth_to_expand(&self) -> usize {
        self.current_depth_to_expand
    }

    pub fn choose<S: State>(&mut self, tree: &Tree<S>) -> OpeningInstructions<S> {
        let mut batch: OpeningInstructions<S> = OpeningInstructions::new();

        let absolute_depth = tree.root_depth() + self.current_depth_to_expand;
        let nodes_to_consider: Vec<NodeRef<S>> = tree
            .descendants
            .nodes_at(absolute_depth)
            .into_iter()
            .filter(|node| !node.borrow().is_over())
            .collect();

        // ascending by the root's subjective view of their value: the most
        // promising nodes land at the tail, where the budget trim keeps them
        let mut sorted = nodes_to_consider;
        let root = tree.root().clone();
        sorted.sort_by(|a, b| {
            let value_a = root
                .borrow()
                .subjective_value_of(a.borrow().evaluation().get_value_white());
            let value_b = root
                .borrow()
                .subjective_value_of(b.borrow().evaluation().get_value_white());
            value_a.total_cmp(&value_b)
        });

        for node in sorted {
            let branches = self.opening_instructor.all_branches_to_open(&node);
            batch.merge(instructions_to_open_all_branches(branches, &node));
        }

        self.current_depth_to_expand += 1;
        batch
    }
}
