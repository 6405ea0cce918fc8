//! Retention configuration for state histories.

use super::error::HistoryError;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

/// Configuration applied when constructing a [`StateHistory`](super::StateHistory).
///
/// # Example
///
/// ```rust
/// use rewind::core::{HistoryConfig, StateHistory};
///
/// let config = HistoryConfig::bounded(2).unwrap();
/// let mut history = StateHistory::with_config(config);
/// history.push(1);
/// history.push(2);
/// history.push(3);
///
/// assert_eq!(history.len(), 2);
/// assert_eq!(*history.initial(), 2);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum retained snapshots (None = unbounded)
    pub limit: Option<NonZeroUsize>,
}

impl HistoryConfig {
    /// Unbounded retention.
    pub fn unbounded() -> Self {
        Self { limit: None }
    }

    /// Retain at most `limit` snapshots. Fails for a zero limit.
    pub fn bounded(limit: usize) -> Result<Self, HistoryError> {
        let limit = NonZeroUsize::new(limit).ok_or(HistoryError::InvalidLimit(limit))?;
        Ok(Self { limit: Some(limit) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unbounded() {
        assert_eq!(HistoryConfig::default(), HistoryConfig::unbounded());
        assert!(HistoryConfig::default().limit.is_none());
    }

    #[test]
    fn zero_limit_is_rejected() {
        assert_eq!(
            HistoryConfig::bounded(0),
            Err(HistoryError::InvalidLimit(0))
        );
    }

    #[test]
    fn config_serializes_correctly() {
        let config = HistoryConfig::bounded(5).unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"limit":5}"#);

        let deserialized: HistoryConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
