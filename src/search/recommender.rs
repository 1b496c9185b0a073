//! Recommender rules: turn the root's minimax state into a policy
//! distribution over branches, then sample the branch to play.

use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::nodes::algorithm_node::NodeRef;
use crate::nodes::minimax::HowEqual;
use crate::state::State;
use crate::utils::math::softmax;

/// Probability distribution over the root's branches. Insertion ordered,
/// probabilities sum to ~1 unless empty.
pub struct BranchPolicy<S: State> {
    pub probs: Vec<(S::Branch, f64)>,
}

impl<S: State> BranchPolicy<S> {
    pub fn empty() -> Self {
        BranchPolicy { probs: Vec::new() }
    }

    pub fn uniform(branches: Vec<S::Branch>) -> Self {
        if branches.is_empty() {
            return Self::empty();
        }
        let probability = 1.0 / branches.len() as f64;
        BranchPolicy {
            probs: branches
                .into_iter()
                .map(|branch| (branch, probability))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    pub fn probability_of(&self, branch: &S::Branch) -> f64 {
        self.probs
            .iter()
            .find(|(known, _)| known == branch)
            .map_or(0.0, |(_, probability)| *probability)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RecommenderRule {
    /// Uniform over the branches whose sort values are logistically
    /// indistinguishable from the head's. The temperature is kept for
    /// configuration compatibility.
    AlmostEqualLogistic { temperature: f64 },
    /// Softmax over the subjective scores of every existing child.
    Softmax { temperature: f64 },
}

impl RecommenderRule {
    pub fn policy<S: State>(&self, root: &NodeRef<S>) -> BranchPolicy<S> {
        match self {
            RecommenderRule::AlmostEqualLogistic { .. } => {
                let root = root.borrow();
                let mut best = root
                    .evaluation()
                    .best_branches_matching(HowEqual::AlmostEqualLogistic);
                if best.is_empty() {
                    best = root
                        .tree_node()
                        .branches_children()
                        .keys()
                        .cloned()
                        .collect();
                }
                BranchPolicy::uniform(best)
            }
            RecommenderRule::Softmax { temperature } => {
                let root = root.borrow();
                let mut branches: Vec<S::Branch> = Vec::new();
                let mut scores: Vec<f64> = Vec::new();
                for (branch, child) in root.tree_node().branches_children() {
                    branches.push(branch.clone());
                    scores
                        .push(root.subjective_value_of(child.borrow().evaluation().get_value_white()));
                }
                if branches.is_empty() {
                    return BranchPolicy::empty();
                }
                let probs = softmax(&scores, *temperature);
                BranchPolicy {
                    probs: branches.into_iter().zip(probs).collect(),
                }
            }
        }
    }

    /// Weighted draw from the policy. `None` on an empty policy.
    pub fn sample<S: State>(
        &self,
        policy: &BranchPolicy<S>,
        rng: &mut StdRng,
    ) -> Option<S::Branch> {
        if policy.is_empty() {
            return None;
        }
        let weights: Vec<f64> = policy.probs.iter().map(|(_, p)| *p).collect();
        let distribution = WeightedIndex::new(&weights).expect("policy probabilities are positive");
        Some(policy.probs[distribution.sample(rng)].0.clone())
    }
}
