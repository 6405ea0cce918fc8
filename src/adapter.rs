//! Bridges from a [`StateHistory`] into the stream world.
//!
//! Histories are shared as [`SharedHistory`] handles so that a stream can
//! hand out the same instance on every subscription.

use crate::core::{SharedHistory, StateHistory};
use crate::stream::{Gate, Stream, StreamError};
use std::rc::Rc;

/// Stream emitting `history` once, then completing.
///
/// Every subscriber receives a handle to the same history instance, not a
/// copy, so mutations made through it are visible to all holders.
///
/// # Example
///
/// ```rust
/// use rewind::adapter::to_stream;
/// use rewind::core::{SharedHistory, StateHistory};
/// use std::rc::Rc;
///
/// let mut history = StateHistory::new();
/// history.push("draft");
/// let shared = history.into_shared();
///
/// let probe = Rc::clone(&shared);
/// to_stream(&shared).subscribe(move |emitted: SharedHistory<&'static str>| {
///     assert!(Rc::ptr_eq(&emitted, &probe));
///     emitted.borrow_mut().push("final");
/// });
///
/// assert_eq!(*shared.borrow().current(), "final");
/// ```
pub fn to_stream<S: 'static>(history: &SharedHistory<S>) -> Stream<SharedHistory<S>> {
    let history = Rc::clone(history);
    Stream::new(move |gate: Gate<SharedHistory<S>>| {
        gate.next(Rc::clone(&history));
        gate.complete();
    })
}

/// Stream emitting the retained snapshots from oldest to newest, then
/// completing.
///
/// Snapshots are cloned out before the first emission, so observers may
/// mutate the history while receiving them. Subscribing while the history
/// is mutably borrowed delivers an error instead.
pub fn to_snapshot_stream<S: Clone + 'static>(history: &SharedHistory<S>) -> Stream<S> {
    let history = Rc::clone(history);
    Stream::new(move |gate: Gate<S>| {
        let snapshots: Vec<S> = match history.try_borrow() {
            Ok(history) => history.iter().cloned().collect(),
            Err(err) => return gate.error(StreamError::failed(err.to_string())),
        };
        tracing::trace!(snapshots = snapshots.len(), "replaying history");
        for snapshot in snapshots {
            gate.next(snapshot);
        }
        gate.complete();
    })
}

impl<S: 'static> StateHistory<S> {
    /// Move this history into a shared handle and stream it once.
    pub fn into_stream(self) -> Stream<SharedHistory<S>> {
        to_stream(&self.into_shared())
    }
}
