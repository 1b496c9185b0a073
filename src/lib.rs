pub mod errors;
pub mod evaluation;
pub mod indices;
pub mod nodes;
pub mod search;
pub mod selectors;
pub mod state;
pub mod tree_manager;
pub mod trees;
pub mod updates;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

pub mod prelude {
    // Usefull struct
    pub use crate::errors::{SearchError, TransitionError};
    pub use crate::indices::index_data::IndexComputation;
    pub use crate::nodes::algorithm_node::{AlgorithmNode, NodeRef};
    pub use crate::nodes::minimax::NodeEvaluation;
    pub use crate::search::config::{
        NodeSelectorConfig, SearchConfig, SearchConfigBuilder, StoppingCriterionConfig,
    };
    pub use crate::search::driver::{
        BranchSearcher, Recommendation, SearchFailure, TreeExplorationResult,
    };
    pub use crate::search::recommender::{BranchPolicy, RecommenderRule};
    pub use crate::selectors::recur_zipf::SamplingPriority;
    pub use crate::selectors::sequool::CandidateMode;
    pub use crate::state::{
        BatchEvaluator, EvalItem, OverEvent, OverOutcome, RepresentationFactory, State,
        TerminalDetector, Turn,
    };
    pub use crate::trees::tree::Tree;

    // Usefull functions
    pub use crate::trees::visualization::tree_to_dot;
}
