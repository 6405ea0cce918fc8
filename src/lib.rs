//! Rewind: cold streams and bounded state history
//!
//! Rewind provides two small primitives for reactive, history-aware
//! application state.
//!
//! # Core Concepts
//!
//! - **Stream**: A lazy, push-based producer re-run on every subscription
//! - **Operators**: Chainable `map`, `filter`, `filter_map`, `tap`, `retry`
//!   and async mapping
//! - **History**: A bounded, doubly linked record of snapshots supporting
//!   undo, path queries and non-destructive updates
//! - **Adapter**: Emits a shared history through a stream
//!
//! # Example
//!
//! ```rust
//! use rewind::adapter::to_snapshot_stream;
//! use rewind::core::StateHistory;
//! use serde_json::json;
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! let mut history = StateHistory::with_limit(3).unwrap();
//! history.push(json!({"doc": {"title": "draft"}}));
//! history.update(["doc", "title"], json!("final")).unwrap();
//! history.push(json!({"doc": {"title": "published"}}));
//!
//! assert_eq!(
//!     history.find(["doc", "title"]).unwrap(),
//!     vec![json!("final"), json!("published")]
//! );
//!
//! let titles = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&titles);
//! to_snapshot_stream(&history.into_shared())
//!     .map(|snapshot| snapshot["doc"]["title"].clone())
//!     .subscribe(move |title| sink.borrow_mut().push(title));
//!
//! assert_eq!(*titles.borrow(), vec![json!("final"), json!("published")]);
//! ```

mod macros;

pub mod adapter;
pub mod core;
pub mod stream;

// Re-export commonly used types
pub use adapter::{to_snapshot_stream, to_stream};
pub use core::{HistoryConfig, HistoryError, Path, PathLens, SharedHistory, StateHistory};
pub use stream::{Disposable, Observer, Stream, StreamError};
