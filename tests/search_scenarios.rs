//! End-to-end scenarios over the table-driven fake game: seed scenarios,
//! boundary behaviors and determinism.

mod common;

use std::rc::Rc;

use branchwise::indices::index_data::IndexVariantData;
use branchwise::prelude::*;

use common::{check_invariants, tags_along_best_line, FakeGame, LookupDetector, LookupEvaluator};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn searcher(
    config: SearchConfig,
    detector: LookupDetector,
    evaluator: LookupEvaluator,
) -> BranchSearcher<FakeGame> {
    BranchSearcher::new(config, Rc::new(detector), Rc::new(evaluator)).unwrap()
}

fn uniform_config(limit: u64) -> SearchConfigBuilder {
    let mut builder = SearchConfigBuilder::default();
    builder
        .node_selector(NodeSelectorConfig::Uniform)
        .stopping_criterion(StoppingCriterionConfig::BranchCountLimit { limit })
        .recommender(RecommenderRule::AlmostEqualLogistic { temperature: 0.1 });
    builder
}

// A single rewarding leaf in a fanout-2 depth-3 tree: the search backs the
// reward up to the root and recommends the line toward it.
#[test]
fn lone_rewarding_leaf_drives_the_recommendation() {
    init_logging();
    let game = FakeGame::binary_tree(3);
    let search = searcher(
        uniform_config(14).build().unwrap(),
        LookupDetector::never_over(),
        LookupEvaluator::new(&[(7, 1.0)]),
    );

    let result = search.recommend(game, 0).unwrap();
    let tree = &result.tree;

    assert_eq!(tree.nodes_count, 15);
    assert_eq!(tree.branch_count, 14);
    check_invariants(tree);

    let root_value = tree.root().borrow().evaluation().get_value_white();
    assert!((root_value - 1.0).abs() < 1e-5);

    let sequence = tree
        .root()
        .borrow()
        .evaluation()
        .best_branch_sequence()
        .to_vec();
    assert_eq!(sequence.len(), 3);
    assert_eq!(tags_along_best_line(tree), vec![1, 3, 7]);

    // the chosen branch is the first step of that line, with certainty
    assert_eq!(result.recommendation.chosen_branch, Some(sequence[0]));
    assert_eq!(
        result.recommendation.policy.probability_of(&sequence[0]),
        1.0
    );
}

// Diamond transposition: the shared child is terminal and winning for
// WHITE, so the whole diamond resolves and the root carries the exact
// terminal evaluation.
#[test]
fn diamond_transposition_resolves_the_root() {
    init_logging();
    let game = FakeGame::new(&[(0, &[1, 2]), (1, &[3]), (2, &[3])], true);
    let search = searcher(
        uniform_config(10).build().unwrap(),
        LookupDetector::with(vec![(3, OverEvent::win(Turn::White, "capture"), 1.0)]),
        LookupEvaluator::new(&[(1, 0.1), (2, -0.1)]),
    );

    let result = search.recommend(game, 3).unwrap();
    let tree = &result.tree;
    check_invariants(tree);

    let shared = tree.descendants.get(2, &3).unwrap().clone();
    assert_eq!(shared.borrow().tree_node().parents().len(), 2);

    let root = tree.root().borrow();
    assert!(root.is_over());
    assert!(root.evaluation().is_winner(Turn::White));
    assert_eq!(root.evaluation().get_value_white(), 1.0);
    drop(root);

    assert!(matches!(
        result.recommendation.evaluation,
        NodeEvaluation::ForcedOutcome { .. }
    ));
}

// A single line of play explored with the zipf walk and global-min-change
// indices: every node ends up annotated, the root at index zero.
#[test]
fn chain_explored_with_recur_zipf_and_min_global_indices() {
    init_logging();
    let game = FakeGame::new(
        &[(0, &[1]), (1, &[2]), (2, &[3]), (3, &[4]), (4, &[5])],
        true,
    );
    let mut builder = SearchConfigBuilder::default();
    builder
        .node_selector(NodeSelectorConfig::RecurZipfBase {
            priority: SamplingPriority::NoPriority,
        })
        .stopping_criterion(StoppingCriterionConfig::BranchCountLimit { limit: 5 })
        .index_computation(Some(IndexComputation::MinGlobalChange))
        .recommender(RecommenderRule::AlmostEqualLogistic { temperature: 0.1 });
    let search = searcher(
        builder.build().unwrap(),
        LookupDetector::with(vec![(5, OverEvent::draw("end of line"), 0.5)]),
        LookupEvaluator::new(&[(0, 0.5), (1, 0.5), (2, 0.5), (3, 0.5), (4, 0.5)]),
    );

    let result = search.recommend(game, 11).unwrap();
    let tree = &result.tree;
    check_invariants(tree);
    assert_eq!(tree.nodes_count, 6);

    for depth in tree.descendants.depths().collect::<Vec<_>>() {
        for node in tree.descendants.nodes_at(depth) {
            let index = node.borrow().exploration().unwrap().index();
            assert!(index.unwrap().is_finite());
        }
    }
    let root_index = tree.root().borrow().exploration().unwrap().index();
    assert_eq!(root_index, Some(0.0));

    let deepest = tree.descendants.get(5, &5).unwrap().clone();
    let data = deepest.borrow().exploration().unwrap().clone();
    match data.variant {
        IndexVariantData::MinGlobal {
            min_path_value,
            max_path_value,
            ..
        } => {
            assert!((min_path_value.unwrap() - 0.5).abs() < 1e-6);
            assert!((max_path_value.unwrap() - 0.5).abs() < 1e-6);
        }
        _ => panic!("expected min-global data"),
    }

    assert_eq!(result.recommendation.chosen_branch, Some(0));
}

// Two plies of alternation: BLACK minimizes in the middle, so the root
// backs up the smaller of the good branch's children.
#[test]
fn alternating_turns_back_up_the_minimum() {
    init_logging();
    let game = FakeGame::new(&[(0, &[1, 2]), (1, &[3, 4]), (2, &[5, 6])], true);
    let search = searcher(
        uniform_config(6).build().unwrap(),
        LookupDetector::never_over(),
        LookupEvaluator::new(&[
            (1, 0.3),
            (2, -0.4),
            (3, 0.1),
            (4, 0.5),
            (5, -0.2),
            (6, -0.6),
        ]),
    );

    let result = search.recommend(game, 5).unwrap();
    let tree = &result.tree;
    check_invariants(tree);

    let root_value = tree.root().borrow().evaluation().get_value_white();
    assert!((root_value - 0.1).abs() < 1e-5);
    assert_eq!(tags_along_best_line(tree), vec![1, 3]);
}

fn three_branch_game() -> (FakeGame, LookupEvaluator) {
    let game = FakeGame::new(&[(0, &[1, 2, 3])], false);
    let evaluator = LookupEvaluator::new(&[(1, 0.5), (2, 0.499), (3, -0.1)]);
    (game, evaluator)
}

// Near-equal top branches share the policy uniformly, the clearly worse
// one is dropped.
#[test]
fn almost_equal_logistic_policy_is_uniform_over_the_top() {
    init_logging();
    let (game, evaluator) = three_branch_game();
    let search = searcher(
        uniform_config(3).build().unwrap(),
        LookupDetector::never_over(),
        evaluator,
    );

    let result = search.recommend(game, 21).unwrap();
    check_invariants(&result.tree);

    let policy = &result.recommendation.policy;
    assert!((policy.probability_of(&0) - 0.5).abs() < 1e-9);
    assert!((policy.probability_of(&1) - 0.5).abs() < 1e-9);
    assert_eq!(policy.probability_of(&2), 0.0);
}

#[test]
fn softmax_policy_splits_the_top_two() {
    init_logging();
    let (game, evaluator) = three_branch_game();
    let mut builder = uniform_config(3);
    builder.recommender(RecommenderRule::Softmax { temperature: 10.0 });
    let search = searcher(
        builder.build().unwrap(),
        LookupDetector::never_over(),
        evaluator,
    );

    let result = search.recommend(game, 21).unwrap();
    let policy = &result.recommendation.policy;

    assert!((policy.probability_of(&0) - 0.5).abs() < 0.01);
    assert!((policy.probability_of(&1) - 0.5).abs() < 0.01);
    assert!(policy.probability_of(&2) < 0.01);
    let total: f64 = policy.probs.iter().map(|(_, p)| p).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

// With a zero budget nothing is opened: the policy degenerates to a
// uniform draw over the root's raw branch set.
#[test]
fn zero_budget_returns_a_degenerate_policy() {
    init_logging();
    let game = FakeGame::new(&[(0, &[1, 2])], false);
    let search = searcher(
        uniform_config(0).build().unwrap(),
        LookupDetector::never_over(),
        LookupEvaluator::new(&[(0, 0.25)]),
    );

    let result = search.recommend(game, 1).unwrap();
    assert_eq!(result.tree.nodes_count, 1);
    let policy = &result.recommendation.policy;
    assert!((policy.probability_of(&0) - 0.5).abs() < 1e-9);
    assert!((policy.probability_of(&1) - 0.5).abs() < 1e-9);
    assert_eq!(
        result.recommendation.evaluation,
        NodeEvaluation::Floating {
            value_white: Some(0.25)
        }
    );
}

#[test]
fn terminal_root_exits_immediately() {
    init_logging();
    let game = FakeGame::new(&[], false);
    let search = searcher(
        uniform_config(50).build().unwrap(),
        LookupDetector::with(vec![(0, OverEvent::win(Turn::Black, "mate"), -1.0)]),
        LookupEvaluator::new(&[]),
    );

    let result = search.recommend(game, 1).unwrap();
    assert_eq!(result.tree.branch_count, 0);
    assert!(matches!(
        result.recommendation.evaluation,
        NodeEvaluation::ForcedOutcome { .. }
    ));
    assert_eq!(result.recommendation.chosen_branch, None);
    assert!(result.recommendation.branch_evals.is_empty());
}

// Every branch terminal: the root is forced into the best available
// outcome, a draw over two losses.
#[test]
fn all_terminal_branches_force_the_best_outcome() {
    init_logging();
    let game = FakeGame::new(&[(0, &[1, 2, 3])], true);
    let search = searcher(
        uniform_config(3).build().unwrap(),
        LookupDetector::with(vec![
            (1, OverEvent::win(Turn::Black, "mate"), -1.0),
            (2, OverEvent::draw("stalemate"), 0.0),
            (3, OverEvent::win(Turn::Black, "mate"), -1.0),
        ]),
        LookupEvaluator::new(&[]),
    );

    let result = search.recommend(game, 9).unwrap();
    let tree = &result.tree;
    check_invariants(tree);

    let root = tree.root().borrow();
    assert!(root.is_over());
    assert!(root.evaluation().is_draw());
    assert_eq!(root.evaluation().get_value_white(), 0.0);
}

#[test]
fn sequool_static_selection_completes_and_is_deterministic() {
    init_logging();
    let run = |seed: u64| {
        let game = FakeGame::binary_tree(3);
        let mut builder = SearchConfigBuilder::default();
        builder
            .node_selector(NodeSelectorConfig::Sequool {
                recursive: false,
                random_depth_pick: false,
                candidate_mode: CandidateMode::LesserInDescendants,
            })
            .stopping_criterion(StoppingCriterionConfig::BranchCountLimit { limit: 10 })
            .index_computation(Some(IndexComputation::MinGlobalChange))
            .recommender(RecommenderRule::AlmostEqualLogistic { temperature: 0.1 });
        let search = searcher(
            builder.build().unwrap(),
            LookupDetector::never_over(),
            LookupEvaluator::new(&[(7, 0.9), (8, 0.4)]),
        );
        search.recommend(game, seed).unwrap()
    };

    let first = run(13);
    check_invariants(&first.tree);
    assert!(first.tree.branch_count <= 10);
    assert!(first.recommendation.chosen_branch.is_some());

    let second = run(13);
    assert_eq!(first.tree.nodes_count, second.tree.nodes_count);
    assert_eq!(first.tree.branch_count, second.tree.branch_count);
    assert_eq!(
        first.recommendation.chosen_branch,
        second.recommendation.chosen_branch
    );
}

#[test]
fn sequool_random_depth_pick_runs_with_depth_extended_indices() {
    init_logging();
    let game = FakeGame::binary_tree(3);
    let mut builder = SearchConfigBuilder::default();
    builder
        .node_selector(NodeSelectorConfig::Sequool {
            recursive: true,
            random_depth_pick: true,
            candidate_mode: CandidateMode::LesserInSubtree,
        })
        .stopping_criterion(StoppingCriterionConfig::BranchCountLimit { limit: 12 })
        .index_computation(Some(IndexComputation::RecurZipf))
        .recommender(RecommenderRule::Softmax { temperature: 1.0 });
    let leaf_draws: Vec<(u32, OverEvent, f64)> = (7..15)
        .map(|tag| (tag, OverEvent::draw("leaf"), 0.0))
        .collect();
    let search = searcher(
        builder.build().unwrap(),
        LookupDetector::with(leaf_draws),
        LookupEvaluator::new(&[(3, 0.7)]),
    );

    let result = search.recommend(game, 29).unwrap();
    check_invariants(&result.tree);
    assert!(result.tree.branch_count <= 12);
    assert!(result.recommendation.chosen_branch.is_some());

    // the scheduler kept the depth-extended counter current on the root
    let root_max_depth = result
        .tree
        .root()
        .borrow()
        .exploration()
        .and_then(|data| data.max_depth_descendants)
        .unwrap();
    assert!(root_max_depth >= 1);
}

#[test]
fn same_seed_reproduces_the_recur_zipf_search() {
    init_logging();
    let run = |seed: u64| {
        let game = FakeGame::binary_tree(3);
        let mut builder = SearchConfigBuilder::default();
        builder
            .node_selector(NodeSelectorConfig::RecurZipfBase {
                priority: SamplingPriority::NoPriority,
            })
            .stopping_criterion(StoppingCriterionConfig::BranchCountLimit { limit: 12 })
            .recommender(RecommenderRule::Softmax { temperature: 2.0 });
        let leaf_draws: Vec<(u32, OverEvent, f64)> = (7..15)
            .map(|tag| (tag, OverEvent::draw("leaf"), if tag == 7 { 0.8 } else { -0.3 }))
            .collect();
        let search = searcher(
            builder.build().unwrap(),
            LookupDetector::with(leaf_draws),
            LookupEvaluator::new(&[(3, 0.2)]),
        );
        search.recommend(game, seed).unwrap()
    };

    let first = run(123);
    let second = run(123);
    check_invariants(&first.tree);
    assert_eq!(first.tree.nodes_count, second.tree.nodes_count);
    assert_eq!(first.tree.branch_count, second.tree.branch_count);
    assert_eq!(
        first.recommendation.chosen_branch,
        second.recommendation.chosen_branch
    );
    assert_eq!(
        tags_along_best_line(&first.tree),
        tags_along_best_line(&second.tree)
    );
}

#[test]
fn depth_limited_uniform_sweep_stops_at_the_cursor() {
    init_logging();
    let game = FakeGame::binary_tree(3);
    let mut builder = SearchConfigBuilder::default();
    builder
        .node_selector(NodeSelectorConfig::Uniform)
        .stopping_criterion(StoppingCriterionConfig::DepthLimit { limit: 2 })
        .recommender(RecommenderRule::AlmostEqualLogistic { temperature: 0.1 });
    let search = searcher(
        builder.build().unwrap(),
        LookupDetector::never_over(),
        LookupEvaluator::new(&[(3, 0.6)]),
    );

    let result = search.recommend(game, 2).unwrap();
    let tree = &result.tree;
    check_invariants(tree);
    // two sweeps: the root's two children, then their four children
    assert_eq!(tree.nodes_count, 7);
    assert_eq!(tree.branch_count, 6);
    assert_eq!(tree.descendants.max_depth(), Some(2));
}

#[test]
fn dot_export_mentions_every_node() {
    init_logging();
    let game = FakeGame::binary_tree(2);
    let search = searcher(
        uniform_config(6).build().unwrap(),
        LookupDetector::never_over(),
        LookupEvaluator::new(&[(3, 0.2)]),
    );
    let result = search.recommend(game, 4).unwrap();

    let dot = tree_to_dot(&result.tree);
    assert!(dot.starts_with("digraph"));
    for id in 0..result.tree.nodes_count {
        assert!(dot.contains(&format!("n{id} [")));
    }
}

#[test]
fn progress_callback_reports_percentages() {
    init_logging();
    use std::cell::RefCell;
    let reports: Rc<RefCell<Vec<u8>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = reports.clone();

    // one node opened per iteration: 15 interior nodes means the every-10
    // notification fires at least once before the tree resolves
    let game = FakeGame::binary_tree(4);
    let leaf_draws: Vec<(u32, OverEvent, f64)> = (15..31)
        .map(|tag| (tag, OverEvent::draw("leaf"), 0.0))
        .collect();
    let mut builder = SearchConfigBuilder::default();
    builder
        .node_selector(NodeSelectorConfig::RecurZipfBase {
            priority: SamplingPriority::NoPriority,
        })
        .stopping_criterion(StoppingCriterionConfig::BranchCountLimit { limit: 40 })
        .recommender(RecommenderRule::AlmostEqualLogistic { temperature: 0.1 });
    let search = searcher(
        builder.build().unwrap(),
        LookupDetector::with(leaf_draws),
        LookupEvaluator::new(&[]),
    )
    .with_progress_callback(move |percent| sink.borrow_mut().push(percent));

    let result = search.recommend(game, 6).unwrap();
    assert!(result.tree.branch_count <= 40);
    let seen = reports.borrow();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|percent| *percent <= 100));
}
