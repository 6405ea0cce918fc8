//! Errors raised by state history operations.

use thiserror::Error;

/// Errors that can occur when querying or mutating a [`StateHistory`](super::StateHistory).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("History is empty")]
    Empty,

    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("Current snapshot is frozen; replace it instead of mutating in place")]
    MutationOfFrozenState,

    #[error("Invalid retention limit {0}; the limit must be at least 1")]
    InvalidLimit(usize),
}
