pub mod opening_instructions;
pub mod recur_zipf;
pub mod sequool;
pub mod uniform;
pub mod zipf;

use rand::rngs::StdRng;

use crate::state::State;
use crate::tree_manager::expansion::TreeExpansions;
use crate::trees::tree::Tree;

pub use opening_instructions::{
    instructions_to_open_all_branches, OpeningInstruction, OpeningInstructions,
    OpeningInstructor, OpeningType,
};
pub use recur_zipf::{RecurZipfBase, SamplingPriority};
pub use sequool::{CandidateMode, DepthPicker, Sequool};
pub use uniform::Uniform;

/// The closed set of node selection policies.
pub enum NodeSelector<S: State> {
    Uniform(Uniform),
    RecurZipfBase(RecurZipfBase),
    Sequool(Sequool<S>),
}

impl<S: State> NodeSelector<S> {
    /// Proposes the next batch of `(node, branch)` expansions.
    pub fn choose(
        &mut self,
        tree: &Tree<S>,
        latest_expansions: &TreeExpansions<S>,
        rng: &mut StdRng,
    ) -> OpeningInstructions<S> {
        match self {
            NodeSelector::Uniform(selector) => selector.choose(tree),
            NodeSelector::RecurZipfBase(selector) => selector.choose(tree, rng),
            NodeSelector::Sequool(selector) => selector.choose(tree, latest_expansions, rng),
        }
    }

    /// The depth cursor, for depth-limited stopping criteria. Only the
    /// Uniform sweep exposes one.
    pub fn current_depth_to_expand(&self) -> Option<usize> {
        match self {
            NodeSelector::Uniform(selector) => Some(selector.current_depth_to_expand()),
            _ => None,
        }
    }
}
