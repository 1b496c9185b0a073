//! The search driver. Each iteration selects a batch of branches to open,
//! trims it to the remaining budget, materializes the children, evaluates
//! the new leaves and propagates the consequences back up. When the
//! monitor signals stop, a branch is recommended from the root's minimax
//! state.

use std::fmt;
use std::rc::Rc;

use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::errors::SearchError;
use crate::evaluation::NodeDirectEvaluator;
use crate::indices::manager::{update_all_indices, IndexManager};
use crate::nodes::minimax::NodeEvaluation;
use crate::search::config::{NodeSelectorConfig, SearchConfig};
use crate::search::monitor::ProgressMonitor;
use crate::search::recommender::BranchPolicy;
use crate::selectors::opening_instructions::OpeningInstructor;
use crate::selectors::recur_zipf::RecurZipfBase;
use crate::selectors::sequool::{DepthPicker, Sequool};
use crate::selectors::uniform::Uniform;
use crate::selectors::NodeSelector;
use crate::state::{BatchEvaluator, RepresentationFactory, State, TerminalDetector};
use crate::tree_manager::algorithm_manager::AlgorithmTreeManager;
use crate::tree_manager::expansion::{TreeExpansion, TreeExpansions};
use crate::tree_manager::manager::TreeManager;
use crate::trees::descendants::RangedDescendants;
use crate::trees::tree::Tree;
use crate::updates::scheduler::UpdateScheduler;

/// The outcome of one search: a recommended branch, the root evaluation,
/// the policy it was sampled from, and per-child evaluations.
pub struct Recommendation<S: State> {
    pub chosen_branch: Option<S::Branch>,
    pub chosen_branch_name: Option<String>,
    pub evaluation: NodeEvaluation<S>,
    pub policy: BranchPolicy<S>,
    pub branch_evals: Vec<(String, NodeEvaluation<S>)>,
}

/// A finished search: the recommendation plus the explored tree.
pub struct TreeExplorationResult<S: State> {
    pub recommendation: Recommendation<S>,
    pub tree: Tree<S>,
}

/// A fatal error together with the partial tree, for diagnostics.
pub struct SearchFailure<S: State> {
    pub error: SearchError,
    pub tree: Tree<S>,
}

impl<S: State> fmt::Debug for SearchFailure<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchFailure")
            .field("error", &self.error)
            .field("tree_nodes", &self.tree.nodes_count)
            .finish()
    }
}

impl<S: State> fmt::Display for SearchFailure<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "search failed: {}", self.error)
    }
}

/// The public entry point. Holds the configuration and the external
/// collaborators; each `recommend` call runs one self-contained search
/// with its own tree and its own seeded RNG.
pub struct BranchSearcher<S: State> {
    config: SearchConfig,
    detector: Rc<dyn TerminalDetector<S>>,
    evaluator: Rc<dyn BatchEvaluator<S>>,
    representation_factory: Option<Rc<dyn RepresentationFactory<S>>>,
    progress_callback: Option<Box<dyn Fn(u8)>>,
}

impl<S: State> BranchSearcher<S> {
    /// Creates a searcher for the given configuration and collaborators
    ///
    /// # Parameters
    /// * `config` - Search configuration (selector, budget, recommender)
    /// * `detector` - Terminal detector for the host game
    /// * `evaluator` - Batched leaf evaluator, shared read-only
    ///
    /// # Returns
    /// The searcher, or a configuration error when cross-field validation
    /// fails
    pub fn new(
        config: SearchConfig,
        detector: Rc<dyn TerminalDetector<S>>,
        evaluator: Rc<dyn BatchEvaluator<S>>,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(BranchSearcher {
            config,
            detector,
            evaluator,
            representation_factory: None,
            progress_callback: None,
        })
    }

    pub fn with_representation_factory(
        mut self,
        factory: Rc<dyn RepresentationFactory<S>>,
    ) -> Self {
        self.representation_factory = Some(factory);
        self
    }

    pub fn with_progress_callback(mut self, callback: impl Fn(u8) + 'static) -> Self {
        self.progress_callback = Some(Box::new(callback));
        self
    }

    fn build_selector(&self) -> NodeSelector<S> {
        let instructor = OpeningInstructor::new(self.config.opening_type);
        match self.config.node_selector {
            NodeSelectorConfig::Uniform => NodeSelector::Uniform(Uniform::new(instructor)),
            NodeSelectorConfig::RecurZipfBase { priority } => {
                NodeSelector::RecurZipfBase(RecurZipfBase::new(instructor, priority))
            }
            NodeSelectorConfig::Sequool {
                recursive,
                random_depth_pick,
                candidate_mode,
            } => {
                let depth_picker = if random_depth_pick {
                    DepthPicker::RandomAll
                } else {
                    DepthPicker::StaticNotOpened {
                        count_visits: Default::default(),
                    }
                };
                NodeSelector::Sequool(Sequool::new(
                    instructor,
                    recursive,
                    depth_picker,
                    candidate_mode,
                ))
            }
        }
    }

    fn log_progress(
        &self,
        tree: &Tree<S>,
        monitor: &ProgressMonitor,
        selector: &NodeSelector<S>,
        rng: &mut StdRng,
    ) {
        if rng.gen::<f64>() >= 0.11 {
            return;
        }
        let root = tree.root().borrow();
        let current_best = root
            .evaluation()
            .best_branch_sequence()
            .first()
            .map(|branch| root.state().branch_name(branch))
            .unwrap_or_else(|| "?".to_string());
        info!(
            "{} | current best branch: {} | current white value: {:?}",
            monitor.progress_string(tree, selector),
            current_best,
            root.evaluation().value_white_minmax(),
        );
        drop(root);
        info!("{}", tree.best_line_string());
    }

    /// Runs one search from `state`, deterministically seeded: the same
    /// `(state, config, seed, evaluator)` reproduces the same result
    /// modulo evaluator determinism.
    ///
    /// # Parameters
    /// * `state` - The root state; consumed, the caller's copy is never
    ///   mutated
    /// * `seed` - Seeds the per-search RNG before exploration
    ///
    /// # Returns
    /// The recommendation together with the explored tree, or the fatal
    /// error wrapping the partial tree
    pub fn recommend(
        &self,
        state: S,
        seed: u64,
    ) -> Result<TreeExplorationResult<S>, SearchFailure<S>> {
        let mut rng = StdRng::seed_from_u64(seed);

        let tree_manager = TreeManager::new(
            self.representation_factory.clone(),
            self.config.index_computation,
            self.config.depth_extended_index(),
            self.config.history_copy_depth,
        );
        let root = tree_manager.create_root(state, 0);
        let mut descendants = RangedDescendants::new();
        descendants.add(&root);
        let mut tree = Tree::new(root, descendants);

        let direct_evaluator =
            NodeDirectEvaluator::new(self.detector.clone(), self.evaluator.clone());
        let scheduler = UpdateScheduler::new(self.config.depth_extended_index());
        let mut manager = AlgorithmTreeManager::new(tree_manager, direct_evaluator, scheduler);

        if let Err(error) = manager.evaluate_root(&tree) {
            return Err(SearchFailure { error, tree });
        }

        let mut selector = self.build_selector();
        let monitor = ProgressMonitor::from_config(self.config.stopping_criterion);
        let index_manager = self.config.index_computation.map(IndexManager::from_computation);

        // the first expansion on record is the creation of the root itself
        let mut expansions: TreeExpansions<S> = TreeExpansions::new();
        expansions.add(TreeExpansion {
            child: tree.root().clone(),
            parent: None,
            modifications: None,
            is_new: true,
            branch: None,
        });

        let mut loop_count: u64 = 0;
        while monitor.should_continue(&tree, &selector) {
            loop_count += 1;
            debug_assert!(!tree.root().borrow().is_over());
            self.log_progress(&tree, &monitor, &selector, &mut rng);

            let instructions = selector.choose(&tree, &expansions, &mut rng);
            let trimmed = monitor.trim(instructions, &tree);
            if trimmed.is_empty() {
                warn!("selector produced an empty expansion batch, skipping it");
            }

            expansions = match manager.open_instructions(&mut tree, trimmed) {
                Ok(expansions) => expansions,
                Err(error) => return Err(SearchFailure { error, tree }),
            };
            manager.update_backward(&expansions);
            if let Err(error) = update_all_indices(&tree, index_manager.as_ref()) {
                return Err(SearchFailure { error, tree });
            }

            if loop_count % 10 == 0 {
                monitor.notify(&tree, &selector, self.progress_callback.as_deref());
            }
        }

        info!("{}", tree.best_line_string());

        let rule = self.config.recommender;
        let mut policy = rule.policy(tree.root());
        if policy.is_empty() {
            // degenerate case: nothing opened yet, fall back to the raw
            // branch set of the root state
            policy = BranchPolicy::uniform(tree.root().borrow().state().branch_keys());
        }
        let chosen_branch = rule.sample(&policy, &mut rng);

        let recommendation = {
            let root = tree.root().borrow();
            let chosen_branch_name = chosen_branch
                .as_ref()
                .map(|branch| root.state().branch_name(branch));
            let branch_evals = root
                .tree_node()
                .branches_children()
                .iter()
                .map(|(branch, child)| {
                    (
                        root.state().branch_name(branch),
                        child.borrow().evaluation().evaluate(),
                    )
                })
                .collect();
            Recommendation {
                chosen_branch,
                chosen_branch_name,
                evaluation: root.evaluation().evaluate(),
                policy,
                branch_evals,
            }
        };

        Ok(TreeExplorationResult {
            recommendation,
            tree,
        })
    }
}
