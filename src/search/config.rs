//! Search configuration: plain data, loadable from JSON, with a builder
//! for programmatic construction.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::errors::SearchError;
use crate::indices::index_data::IndexComputation;
use crate::search::recommender::RecommenderRule;
use crate::selectors::opening_instructions::OpeningType;
use crate::selectors::recur_zipf::SamplingPriority;
use crate::selectors::sequool::CandidateMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeSelectorConfig {
    Uniform,
    RecurZipfBase {
        priority: SamplingPriority,
    },
    Sequool {
        recursive: bool,
        random_depth_pick: bool,
        candidate_mode: CandidateMode,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoppingCriterionConfig {
    /// Stop once `branch_count` reaches the limit.
    BranchCountLimit { limit: u64 },
    /// Stop once the selector's depth cursor reaches the limit. Requires
    /// a selector that exposes one.
    DepthLimit { limit: usize },
}

#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct SearchConfig {
    pub node_selector: NodeSelectorConfig,

    #[builder(default)]
    pub opening_type: OpeningType,

    pub stopping_criterion: StoppingCriterionConfig,

    #[builder(default)]
    pub index_computation: Option<IndexComputation>,

    pub recommender: RecommenderRule,

    /// Nodes closer than this to the root copy the state history when
    /// expanding, keeping repetition-style terminal rules accurate near
    /// the root.
    #[builder(default = "2")]
    pub history_copy_depth: usize,
}

impl SearchConfig {
    /// Cross-field validation, run once when the searcher is built.
    pub fn validate(&self) -> Result<(), SearchError> {
        if matches!(self.stopping_criterion, StoppingCriterionConfig::DepthLimit { .. })
            && !matches!(self.node_selector, NodeSelectorConfig::Uniform)
        {
            return Err(SearchError::Configuration(
                "a depth limit needs a selector exposing a depth cursor (Uniform)".to_string(),
            ));
        }
        if matches!(
            self.node_selector,
            NodeSelectorConfig::Sequool {
                random_depth_pick: true,
                ..
            }
        ) && self.index_computation.is_none()
        {
            return Err(SearchError::Configuration(
                "random depth picking needs depth-extended index data, set an index computation"
                    .to_string(),
            ));
        }
        Ok(())
    }

    /// Depth-extended index data is carried when the Sequool selector
    /// picks depths at random: it reads `max_depth_of_descendants` on the
    /// root.
    pub fn depth_extended_index(&self) -> bool {
        matches!(
            self.node_selector,
            NodeSelectorConfig::Sequool {
                random_depth_pick: true,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_builder() -> SearchConfigBuilder {
        let mut builder = SearchConfigBuilder::default();
        builder
            .node_selector(NodeSelectorConfig::Uniform)
            .stopping_criterion(StoppingCriterionConfig::BranchCountLimit { limit: 100 })
            .recommender(RecommenderRule::Softmax { temperature: 1.0 });
        builder
    }

    #[test]
    fn builder_fills_defaults() {
        let config = base_builder().build().unwrap();
        assert_eq!(config.history_copy_depth, 2);
        assert!(config.index_computation.is_none());
        assert_eq!(config.opening_type, OpeningType::AllChildren);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn depth_limit_requires_a_depth_cursor() {
        let mut builder = base_builder();
        builder
            .node_selector(NodeSelectorConfig::RecurZipfBase {
                priority: SamplingPriority::NoPriority,
            })
            .stopping_criterion(StoppingCriterionConfig::DepthLimit { limit: 4 });
        let config = builder.build().unwrap();
        assert!(matches!(
            config.validate(),
            Err(SearchError::Configuration(_))
        ));
    }

    #[test]
    fn random_depth_pick_requires_an_index() {
        let mut builder = base_builder();
        builder.node_selector(NodeSelectorConfig::Sequool {
            recursive: false,
            random_depth_pick: true,
            candidate_mode: CandidateMode::LesserInDescendants,
        });
        let config = builder.build().unwrap();
        assert!(matches!(
            config.validate(),
            Err(SearchError::Configuration(_))
        ));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = base_builder().build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let back: SearchConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.node_selector, config.node_selector);
        assert_eq!(back.stopping_criterion, config.stopping_criterion);
    }
}
