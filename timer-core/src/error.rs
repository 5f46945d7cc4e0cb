//! Error types for engine operations

use thiserror::Error;

use crate::engine::TimerState;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimerError {
    /// The operation is not allowed in the engine's current state.
    #[error("{op} is not allowed while {state:?}")]
    Precondition {
        op: &'static str,
        state: TimerState,
    },

    /// A requested duration was negative, non-finite or could not be parsed.
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}
