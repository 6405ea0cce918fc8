//! State history and its supporting types.
//!
//! This module contains the synchronous half of the crate:
//! - [`StateHistory`], an arena-backed doubly linked chain of snapshots
//! - [`PathLens`] and [`Path`] for path-scoped queries and updates
//! - [`HistoryConfig`] for retention limits
//!
//! Nothing in this module knows about streams; see [`crate::adapter`] for
//! the bridge.

mod config;
mod error;
mod history;
mod lens;

pub use config::HistoryConfig;
pub use error::HistoryError;
pub use history::{Entries, HistoryEntry, SharedHistory, StateHistory};
pub use lens::{Path, PathLens, PathSegment};
