//! Error kinds of the search core.
//!
//! Recoverable conditions (an exhausted budget, an empty expansion batch)
//! never show up here: they end the loop gracefully. Everything below is
//! fatal to the running search and is surfaced to the caller together with
//! the partial tree.

use thiserror::Error;

/// Contract violation reported by the external state machine while
/// stepping or copying a state.
#[derive(Debug, Clone, Error)]
#[error("invalid state transition: {0}")]
pub struct TransitionError(pub String);

#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// `step` or `copy` contract violated by the state machine.
    #[error("invalid state transition: {0}")]
    InvalidTransition(String),

    /// The batch evaluator returned the wrong number of scalars.
    #[error("batch evaluator returned {got} values for {expected} queries")]
    EvaluatorFailure { expected: usize, got: usize },

    /// An exploration-index variant was queried at a node carrying a
    /// different variant's record. Configuration bug.
    #[error("exploration index data does not match the configured index computation")]
    InconsistentIndex,

    /// The terminal detector reported a terminal state without an
    /// authoritative evaluation.
    #[error("terminal detector reported a terminal state without an evaluation")]
    UnresolvableTerminal,

    /// Cross-field configuration validation failed at build time.
    #[error("invalid search configuration: {0}")]
    Configuration(String),
}

impl From<TransitionError> for SearchError {
    fn from(err: TransitionError) -> Self {
        SearchError::InvalidTransition(err.0)
    }
}
