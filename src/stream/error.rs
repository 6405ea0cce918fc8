//! Errors delivered through stream error channels.

use crate::core::HistoryError;
use std::fmt;
use thiserror::Error;

/// Errors carried by a stream's error signal.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StreamError {
    #[error("Operator failed: {0}")]
    Failed(String),

    #[error("Async operation rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    History(#[from] HistoryError),
}

impl StreamError {
    /// Failure raised by a projection, predicate or effect.
    pub fn failed(message: impl Into<String>) -> Self {
        StreamError::Failed(message.into())
    }

    /// Failure raised by an awaited operation.
    pub fn rejected(reason: impl fmt::Display) -> Self {
        StreamError::Rejected(reason.to_string())
    }
}
