//! Observers, subscription gates and disposables.

use super::error::StreamError;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

type NextFn<T> = Rc<dyn Fn(T)>;
type ErrorFn = Rc<dyn Fn(StreamError)>;
type CompleteFn = Rc<dyn Fn()>;

/// Unique identifier for a subscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub Uuid);

impl SubscriptionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Set of optional callbacks receiving a stream's signals.
///
/// A bare closure converts into an observer with only `next` set, so both
/// forms are accepted by [`Stream::subscribe`](super::Stream::subscribe).
///
/// # Example
///
/// ```rust
/// use rewind::stream::{Observer, Stream};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let log = Rc::new(RefCell::new(Vec::new()));
/// let (on_next, on_complete) = (Rc::clone(&log), Rc::clone(&log));
///
/// Stream::of([1, 2]).subscribe(
///     Observer::new()
///         .on_next(move |x: i32| on_next.borrow_mut().push(x.to_string()))
///         .on_complete(move || on_complete.borrow_mut().push("done".into())),
/// );
///
/// assert_eq!(*log.borrow(), vec!["1", "2", "done"]);
/// ```
pub struct Observer<T> {
    next: Option<NextFn<T>>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            next: self.next.clone(),
            error: self.error.clone(),
            complete: self.complete.clone(),
        }
    }
}

impl<T> Default for Observer<T> {
    fn default() -> Self {
        Self {
            next: None,
            error: None,
            complete: None,
        }
    }
}

impl<T: 'static> Observer<T> {
    /// Observer with no callbacks.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_next(mut self, next: impl Fn(T) + 'static) -> Self {
        self.next = Some(Rc::new(next));
        self
    }

    pub fn on_error(mut self, error: impl Fn(StreamError) + 'static) -> Self {
        self.error = Some(Rc::new(error));
        self
    }

    pub fn on_complete(mut self, complete: impl Fn() + 'static) -> Self {
        self.complete = Some(Rc::new(complete));
        self
    }
}

impl<T> Observer<T> {
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn has_complete(&self) -> bool {
        self.complete.is_some()
    }
}

impl<T, F> From<F> for Observer<T>
where
    F: Fn(T) + 'static,
{
    fn from(next: F) -> Self {
        Self {
            next: Some(Rc::new(next)),
            error: None,
            complete: None,
        }
    }
}

impl<T> fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("next", &self.has_next())
            .field("error", &self.has_error())
            .field("complete", &self.has_complete())
            .finish()
    }
}

/// Per-subscription gate in front of an [`Observer`].
///
/// The gate delivers at most one terminal signal. After `error`, `complete`
/// or `terminate`, every further signal is dropped.
pub struct Gate<T> {
    id: SubscriptionId,
    observer: Rc<Observer<T>>,
    terminated: Rc<Cell<bool>>,
}

impl<T> Clone for Gate<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            observer: Rc::clone(&self.observer),
            terminated: Rc::clone(&self.terminated),
        }
    }
}

impl<T> Gate<T> {
    pub(crate) fn new(observer: Observer<T>) -> Self {
        Self {
            id: SubscriptionId::new(),
            observer: Rc::new(observer),
            terminated: Rc::new(Cell::new(false)),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.get()
    }

    /// Deliver a value. Dropped once terminated.
    pub fn next(&self, value: T) {
        if self.is_terminated() {
            return;
        }
        if let Some(next) = &self.observer.next {
            next(value);
        }
    }

    /// Deliver an error and terminate.
    ///
    /// Without an error callback the error is swallowed.
    pub fn error(&self, err: StreamError) {
        if self.is_terminated() {
            return;
        }
        match &self.observer.error {
            Some(error) => error(err),
            None => tracing::debug!(
                subscription = %self.id,
                error = %err,
                "unhandled stream error swallowed"
            ),
        }
        self.terminate();
    }

    /// Deliver completion and terminate.
    pub fn complete(&self) {
        if self.is_terminated() {
            return;
        }
        if let Some(complete) = &self.observer.complete {
            complete();
        }
        self.terminate();
    }

    pub fn terminate(&self) {
        if !self.terminated.replace(true) {
            tracing::trace!(subscription = %self.id, "subscription terminated");
        }
    }

    pub(crate) fn disposable(&self) -> Disposable {
        Disposable {
            id: self.id,
            terminated: Rc::clone(&self.terminated),
        }
    }
}

impl<T> fmt::Debug for Gate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate")
            .field("id", &self.id)
            .field("terminated", &self.is_terminated())
            .finish()
    }
}

/// Handle returned by `subscribe`.
///
/// Dropping a `Disposable` does not end the subscription; call
/// [`dispose`](Self::dispose).
#[derive(Clone, Debug)]
pub struct Disposable {
    id: SubscriptionId,
    terminated: Rc<Cell<bool>>,
}

impl Disposable {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Stop all future delivery to the subscription's observer. Idempotent.
    pub fn dispose(&self) {
        if !self.terminated.replace(true) {
            tracing::trace!(subscription = %self.id, "subscription disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.terminated.get()
    }
}
