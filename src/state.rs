//! External contracts consumed by the search core.
//!
//! The engine never inspects state internals: everything it needs from the
//! host game is behind the `State` trait (hashable transposition tag, side
//! to move, branch enumeration, stepping) and the two evaluation
//! capabilities (`TerminalDetector`, `BatchEvaluator`). An optional
//! `RepresentationFactory` lets hosts thread an incremental evaluator input
//! (e.g. a tensor encoding) through expansions.

use std::fmt;
use std::hash::Hash;

use crate::errors::TransitionError;

/// Side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Turn {
    White,
    Black,
}

impl Turn {
    pub fn other(self) -> Turn {
        match self {
            Turn::White => Turn::Black,
            Turn::Black => Turn::White,
        }
    }
}

/// Terminal outcome of a state: a win for one side or a draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverOutcome {
    Win { winner: Turn },
    Draw,
}

/// Terminal resolution record: outcome plus the reason code reported by the
/// terminal detector. Once attached to a node it is never modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverEvent {
    pub outcome: OverOutcome,
    pub termination: String,
}

impl OverEvent {
    pub fn win(winner: Turn, termination: impl Into<String>) -> Self {
        OverEvent {
            outcome: OverOutcome::Win { winner },
            termination: termination.into(),
        }
    }

    pub fn draw(termination: impl Into<String>) -> Self {
        OverEvent {
            outcome: OverOutcome::Draw,
            termination: termination.into(),
        }
    }

    pub fn is_win(&self) -> bool {
        matches!(self.outcome, OverOutcome::Win { .. })
    }

    pub fn is_draw(&self) -> bool {
        matches!(self.outcome, OverOutcome::Draw)
    }

    /// Whether `player` is the declared winner.
    pub fn is_winner(&self, player: Turn) -> bool {
        match self.outcome {
            OverOutcome::Win { winner } => winner == player,
            OverOutcome::Draw => false,
        }
    }

    /// Short tag used in DOT descriptions and log lines.
    pub fn over_tag(&self) -> String {
        match self.outcome {
            OverOutcome::Win { winner: Turn::White } => format!("win-white({})", self.termination),
            OverOutcome::Win { winner: Turn::Black } => format!("win-black({})", self.termination),
            OverOutcome::Draw => format!("draw({})", self.termination),
        }
    }
}

/// The external state machine.
///
/// `tag` equality defines transposition at a given depth. `step` advances
/// the state in place and may return an opaque modifications record that is
/// forwarded to the representation factory.
pub trait State {
    type Tag: Clone + Eq + Hash + fmt::Debug;
    type Branch: Clone + Eq + Hash + fmt::Debug;
    type Modifications;
    type Representation;

    fn tag(&self) -> Self::Tag;

    fn turn(&self) -> Turn;

    /// Available branches, eagerly materialized, in a deterministic order.
    fn branch_keys(&self) -> Vec<Self::Branch>;

    fn is_terminal(&self) -> bool;

    /// Human readable name of a branch, for recommendations and logs.
    fn branch_name(&self, branch: &Self::Branch) -> String;

    /// Copy deep enough to be stepped independently. The history (needed
    /// for repetition-style terminal rules) is only carried along when
    /// `include_history` is set.
    fn copy(&self, include_history: bool) -> Self;

    /// Advance this state along `branch`.
    fn step(&mut self, branch: &Self::Branch)
        -> Result<Option<Self::Modifications>, TransitionError>;
}

/// Detects terminal states. A terminal report must come with an
/// authoritative white-perspective evaluation; a terminal report without
/// one is a fatal contract violation.
pub trait TerminalDetector<S: State> {
    fn check_terminal(&self, state: &S) -> (Option<OverEvent>, Option<f64>);
}

/// One entry of a batched evaluation request.
pub struct EvalItem<'a, S: State> {
    pub state: &'a S,
    pub representation: Option<&'a S::Representation>,
}

/// Direct leaf evaluator, possibly batching onto an accelerator. Must
/// return exactly one white-perspective scalar per input item.
pub trait BatchEvaluator<S: State> {
    fn evaluate_batch(&self, items: &[EvalItem<'_, S>]) -> Vec<f64>;
}

/// Builds an evaluator-input representation from the parent's
/// representation plus the `step` modifications. Opaque to the core.
pub trait RepresentationFactory<S: State> {
    fn create_from_transition(
        &self,
        state: &S,
        previous: Option<&S::Representation>,
        modifications: Option<&S::Modifications>,
    ) -> S::Representation;
}
