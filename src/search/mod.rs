pub mod config;
pub mod driver;
pub mod monitor;
pub mod recommender;

pub use config::{NodeSelectorConfig, SearchConfig, SearchConfigBuilder, StoppingCriterionConfig};
pub use driver::{BranchSearcher, Recommendation, SearchFailure, TreeExplorationResult};
pub use monitor::ProgressMonitor;
pub use recommender::{BranchPolicy, RecommenderRule};
