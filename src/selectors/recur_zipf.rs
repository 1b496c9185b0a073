//! The RecurZipfBase selector: a random descent from the root, at each
//! node sampling among the value-ranked not-over branches with zipf
//! weights, until a frontier node is reached.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::nodes::algorithm_node::NodeRef;
use crate::selectors::opening_instructions::{
    instructions_to_open_all_branches, OpeningInstructions, OpeningInstructor,
};
use crate::selectors::zipf::zipf_pick_random;
use crate::state::State;
use crate::trees::tree::Tree;

/// Sampling priority configuration of the zipf walk, carried through the
/// configuration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SamplingPriority {
    #[default]
    NoPriority,
    PriorityBest,
    PriorityTwoBest,
}

pub struct RecurZipfBase {
    opening_instructor: OpeningInstructor,
    #[allow(dead_code)]
    priority: SamplingPriority,
}

impl RecurZipfBase {
    pub fn new(opening_instructor: OpeningInstructor, priority: SamplingPriority) -> Self {
        RecurZipfBase {
            opening_instructor,
            priority,
        }
    }

    pub fn choose<S: State>(
        &mut self,
        tree: &Tree<S>,
        rng: &mut StdRng,
    ) -> OpeningInstructions<S> {
        let mut wandering_node: NodeRef<S> = tree.root().clone();

        loop {
            let sorted_not_over = wandering_node
                .borrow()
                .evaluation()
                .sort_branches_not_over();
            if sorted_not_over.is_empty() {
                break;
            }
            debug_assert!(!wandering_node.borrow().is_over());
            let branch =
                zipf_pick_random(&sorted_not_over, rng).expect("non-empty branch list");
            let next_node = wandering_node
                .borrow()
                .tree_node()
                .child(&branch)
                .cloned()
                .expect("a not-over branch has an opened child");
            wandering_node = next_node;
        }

        let branches = self.opening_instructor.all_branches_to_open(&wandering_node);
        instructions_to_open_all_branches(branches, &wandering_node)
    }
}
