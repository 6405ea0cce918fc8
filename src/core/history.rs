//! Bounded, bidirectionally navigable state history.
//!
//! Snapshots live in an arena of nodes linked by index in both directions.
//! The history alone owns the nodes; `prev`/`next` are plain indices used for
//! traversal, so there is no ownership cycle between neighbours.

use super::config::HistoryConfig;
use super::error::HistoryError;
use super::lens::{Path, PathLens};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cell::RefCell;
use std::fmt;
use std::num::NonZeroUsize;
use std::rc::Rc;
use std::time::Duration;

/// A history shared between the code that mutates it and the streams that observe it.
pub type SharedHistory<S> = Rc<RefCell<StateHistory<S>>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct NodeId(usize);

#[derive(Clone, Debug)]
struct Node<S> {
    snapshot: S,
    recorded_at: DateTime<Utc>,
    /// Set once a newer node has been appended after this one.
    frozen: bool,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

/// Read-only view of one retained snapshot.
#[derive(Debug)]
pub struct HistoryEntry<'a, S> {
    pub snapshot: &'a S,
    pub recorded_at: DateTime<Utc>,
    pub frozen: bool,
}

impl<S> Clone for HistoryEntry<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for HistoryEntry<'_, S> {}

/// Ordered history of state snapshots, oldest (initial) to newest (current).
///
/// Appending supersedes the current snapshot and freezes it. An optional
/// retention limit evicts the oldest snapshot when a push would exceed it.
///
/// # Example
///
/// ```rust
/// use rewind::core::StateHistory;
/// use serde_json::json;
///
/// let mut history = StateHistory::new();
/// history.push(json!({"data": {"data": "first"}}));
/// history.push(json!({"data": {"data": "second"}}));
/// history.push(json!({"data": {"data": "third"}}));
///
/// assert_eq!(history.len(), 3);
/// assert_eq!(history.previous(), &json!({"data": {"data": "second"}}));
///
/// let found = history.find(["data", "data"]).unwrap();
/// assert_eq!(found, vec![json!("first"), json!("second"), json!("third")]);
///
/// assert_eq!(history.rollback(), Some(json!({"data": {"data": "third"}})));
/// assert_eq!(history.len(), 2);
/// ```
#[derive(Clone)]
pub struct StateHistory<S> {
    slots: Vec<Option<Node<S>>>,
    free: Vec<usize>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
    limit: Option<NonZeroUsize>,
}

impl<S> Default for StateHistory<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateHistory<S> {
    /// Create a new empty, unbounded history.
    pub fn new() -> Self {
        Self::with_config(HistoryConfig::default())
    }

    pub fn with_config(config: HistoryConfig) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
            limit: config.limit,
        }
    }

    /// Create an empty history retaining at most `limit` snapshots.
    pub fn with_limit(limit: usize) -> Result<Self, HistoryError> {
        HistoryConfig::bounded(limit).map(Self::with_config)
    }

    pub fn config(&self) -> HistoryConfig {
        HistoryConfig { limit: self.limit }
    }

    /// Wrap the history for sharing with stream adapters.
    pub fn into_shared(self) -> SharedHistory<S> {
        Rc::new(RefCell::new(self))
    }

    // --- Arena ---

    fn alloc(&mut self, node: Node<S>) -> NodeId {
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Node<S> {
        match self.slots[id.0].take() {
            Some(node) => {
                self.free.push(id.0);
                node
            }
            None => unreachable!("history node {id:?} released twice"),
        }
    }

    fn node(&self, id: NodeId) -> &Node<S> {
        match &self.slots[id.0] {
            Some(node) => node,
            None => unreachable!("dangling history node {id:?}"),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<S> {
        match &mut self.slots[id.0] {
            Some(node) => node,
            None => unreachable!("dangling history node {id:?}"),
        }
    }

    fn unlink_head(&mut self) -> Option<Node<S>> {
        let head = self.head?;
        let node = self.release(head);
        match node.next {
            Some(next) => {
                self.node_mut(next).prev = None;
                self.head = Some(next);
            }
            None => {
                self.head = None;
                self.tail = None;
            }
        }
        self.len -= 1;
        Some(node)
    }

    fn unlink_tail(&mut self) -> Option<Node<S>> {
        let tail = self.tail?;
        let node = self.release(tail);
        match node.prev {
            Some(prev) => {
                self.node_mut(prev).next = None;
                self.tail = Some(prev);
            }
            None => {
                self.head = None;
                self.tail = None;
            }
        }
        self.len -= 1;
        Some(node)
    }

    fn push_entry(&mut self, snapshot: S, recorded_at: DateTime<Utc>) {
        if let Some(limit) = self.limit {
            while self.len >= limit.get() {
                if self.unlink_head().is_none() {
                    break;
                }
                tracing::debug!(limit = limit.get(), "evicted oldest snapshot");
            }
        }

        let id = self.alloc(Node {
            snapshot,
            recorded_at,
            frozen: false,
            prev: self.tail,
            next: None,
        });

        match self.tail {
            Some(previous) => {
                let superseded = self.node_mut(previous);
                superseded.frozen = true;
                superseded.next = Some(id);
            }
            None => self.head = Some(id),
        }

        self.tail = Some(id);
        self.len += 1;
    }

    // --- Mutation ---

    /// Append a snapshot as the new current state.
    ///
    /// The previous current snapshot is frozen. With a retention limit set,
    /// the oldest snapshots are evicted until the new one fits.
    pub fn push(&mut self, snapshot: S) {
        self.push_entry(snapshot, Utc::now());
        tracing::trace!(len = self.len, "snapshot appended");
    }

    /// Remove and return the oldest snapshot, or `None` when empty.
    pub fn shift(&mut self) -> Option<S> {
        self.unlink_head().map(|node| node.snapshot)
    }

    /// Remove and return the current snapshot, or `None` when empty.
    ///
    /// The snapshot before it becomes current again.
    pub fn pop(&mut self) -> Option<S> {
        self.unlink_tail().map(|node| node.snapshot)
    }

    /// Undo the latest snapshot. Alias of [`pop`](Self::pop).
    pub fn rollback(&mut self) -> Option<S> {
        self.pop()
    }

    /// Overwrite the current snapshot, returning the stored value.
    pub fn replace(&mut self, snapshot: S) -> Result<&S, HistoryError> {
        let tail = self.tail.ok_or(HistoryError::Empty)?;
        let node = self.node_mut(tail);
        node.snapshot = snapshot;
        node.frozen = false;
        Ok(&node.snapshot)
    }

    /// Mutate the current snapshot in place.
    ///
    /// Fails with [`HistoryError::MutationOfFrozenState`] when the current
    /// snapshot was superseded earlier and became current again through
    /// [`pop`](Self::pop) or [`reset`](Self::reset). Use
    /// [`replace`](Self::replace) or [`update`](Self::update) for those.
    pub fn modify_current<F>(&mut self, mutate: F) -> Result<&S, HistoryError>
    where
        F: FnOnce(&mut S),
    {
        let tail = self.tail.ok_or(HistoryError::Empty)?;
        let node = self.node_mut(tail);
        if node.frozen {
            return Err(HistoryError::MutationOfFrozenState);
        }
        mutate(&mut node.snapshot);
        Ok(&node.snapshot)
    }

    /// Truncate back to the origin snapshot.
    ///
    /// The oldest retained snapshot becomes the only one. No-op when empty.
    pub fn reset(&mut self) {
        let Some(head) = self.head else {
            return;
        };

        let discarded = self.len - 1;
        let mut origin = self.release(head);
        origin.prev = None;
        origin.next = None;

        self.slots.clear();
        self.free.clear();
        let id = self.alloc(origin);
        self.head = Some(id);
        self.tail = Some(id);
        self.len = 1;

        tracing::debug!(discarded, "history reset to origin");
    }

    /// Set the retention ceiling used by future pushes.
    ///
    /// A history already longer than `limit` is not trimmed until the next push.
    pub fn set_limit(&mut self, limit: usize) -> Result<(), HistoryError> {
        let limit = NonZeroUsize::new(limit).ok_or(HistoryError::InvalidLimit(limit))?;
        self.limit = Some(limit);
        tracing::debug!(limit = limit.get(), len = self.len, "retention limit set");
        Ok(())
    }

    pub fn clear_limit(&mut self) {
        self.limit = None;
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit.map(NonZeroUsize::get)
    }

    // --- Queries ---

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current (newest) snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the history is empty. Use [`get_current`](Self::get_current)
    /// when emptiness is expected.
    pub fn current(&self) -> &S {
        self.get_current()
            .expect("current() called on an empty history")
    }

    /// Initial (oldest retained) snapshot.
    ///
    /// # Panics
    ///
    /// Panics if the history is empty.
    pub fn initial(&self) -> &S {
        self.get_initial()
            .expect("initial() called on an empty history")
    }

    /// Snapshot immediately before the current one.
    ///
    /// # Panics
    ///
    /// Panics if fewer than two snapshots are retained.
    pub fn previous(&self) -> &S {
        self.get_previous()
            .expect("previous() requires at least two snapshots")
    }

    pub fn get_current(&self) -> Option<&S> {
        self.tail.map(|id| &self.node(id).snapshot)
    }

    pub fn get_initial(&self) -> Option<&S> {
        self.head.map(|id| &self.node(id).snapshot)
    }

    pub fn get_previous(&self) -> Option<&S> {
        let tail = self.tail?;
        let prev = self.node(tail).prev?;
        Some(&self.node(prev).snapshot)
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> Entries<'_, S> {
        Entries {
            history: self,
            front: self.head,
            back: self.tail,
            remaining: self.len,
        }
    }

    /// Snapshots from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &S> + ExactSizeIterator + '_ {
        self.entries().map(|entry| entry.snapshot)
    }

    /// Time elapsed between recording the initial and the current snapshot.
    ///
    /// Returns `None` if the history is empty.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.node(self.head?).recorded_at;
        let last = self.node(self.tail?).recorded_at;
        last.signed_duration_since(first).to_std().ok()
    }
}

impl<S: PathLens + Clone> StateHistory<S> {
    /// Collect the value at `path` from every snapshot, oldest first.
    ///
    /// Snapshots where the value is absent or falsy are skipped.
    pub fn find(&self, path: impl Into<Path>) -> Result<Vec<S>, HistoryError> {
        let path = path.into();
        if path.is_empty() {
            return Err(HistoryError::MissingArgument("path"));
        }

        Ok(self
            .iter()
            .filter_map(|snapshot| snapshot.view(&path))
            .filter(|value| value.is_truthy())
            .cloned()
            .collect())
    }

    /// Set `value` at `path` in the current snapshot.
    ///
    /// The stored snapshot is replaced by an updated copy; earlier snapshots
    /// are never touched.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rewind::core::StateHistory;
    /// use serde_json::json;
    ///
    /// let mut history = StateHistory::new();
    /// history.push(json!({"count": 1}));
    /// history.push(json!({"count": 2}));
    ///
    /// let updated = history.update(["count"], json!(3)).unwrap();
    /// assert_eq!(updated, &json!({"count": 3}));
    /// assert_eq!(history.initial(), &json!({"count": 1}));
    /// ```
    pub fn update(&mut self, path: impl Into<Path>, value: S) -> Result<&S, HistoryError> {
        let path = path.into();
        if path.is_empty() {
            return Err(HistoryError::MissingArgument("path"));
        }

        let tail = self.tail.ok_or(HistoryError::Empty)?;
        let node = self.node_mut(tail);
        node.snapshot = node.snapshot.set(&path, value);
        node.frozen = false;
        Ok(&node.snapshot)
    }
}

/// Iterator over [`HistoryEntry`] values, oldest to newest.
pub struct Entries<'a, S> {
    history: &'a StateHistory<S>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, S> Iterator for Entries<'a, S> {
    type Item = HistoryEntry<'a, S>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.history.node(self.front?);
        self.front = node.next;
        self.remaining -= 1;
        Some(node.entry())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<S> DoubleEndedIterator for Entries<'_, S> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.history.node(self.back?);
        self.back = node.prev;
        self.remaining -= 1;
        Some(node.entry())
    }
}

impl<S> ExactSizeIterator for Entries<'_, S> {}

impl<S> Node<S> {
    fn entry(&self) -> HistoryEntry<'_, S> {
        HistoryEntry {
            snapshot: &self.snapshot,
            recorded_at: self.recorded_at,
            frozen: self.frozen,
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for StateHistory<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateHistory")
            .field("len", &self.len)
            .field("limit", &self.limit())
            .field("snapshots", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Serialize)]
struct EntryRef<'a, S> {
    snapshot: &'a S,
    recorded_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct HistoryRef<'a, S> {
    limit: Option<NonZeroUsize>,
    entries: Vec<EntryRef<'a, S>>,
}

#[derive(Deserialize)]
struct OwnedEntry<S> {
    snapshot: S,
    recorded_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct OwnedHistory<S> {
    limit: Option<NonZeroUsize>,
    entries: Vec<OwnedEntry<S>>,
}

impl<S: Serialize> Serialize for StateHistory<S> {
    fn serialize<Ser: Serializer>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error> {
        HistoryRef {
            limit: self.limit,
            entries: self
                .entries()
                .map(|entry| EntryRef {
                    snapshot: entry.snapshot,
                    recorded_at: entry.recorded_at,
                })
                .collect(),
        }
        .serialize(serializer)
    }
}

/// Entries are restored exactly as serialized, then the limit is applied.
///
/// Like [`StateHistory::set_limit`], the limit is not retroactive: a payload
/// holding more entries than its limit (as produced after lowering the limit
/// on a longer history) loads in full and is trimmed by the next push.
impl<'de, S: Deserialize<'de>> Deserialize<'de> for StateHistory<S> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let owned = OwnedHistory::<S>::deserialize(deserializer)?;
        let mut history = Self::new();
        for entry in owned.entries {
            history.push_entry(entry.snapshot, entry.recorded_at);
        }
        history.limit = owned.limit;
        Ok(history)
    }
}
