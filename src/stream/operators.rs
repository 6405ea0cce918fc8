//! Synchronous operators.
//!
//! Every operator returns a new stream whose producer subscribes to the
//! source with a relay observer. Fallible `try_*` forms route an `Err` from
//! the user function to the downstream error signal; the infallible forms
//! are thin wrappers over them.

use super::cold::Stream;
use super::error::StreamError;
use super::observer::{Gate, Observer};
use std::cell::Cell;
use std::rc::Rc;

/// Relay observer forwarding `error` and `complete` unchanged.
fn relay<T, U, F>(downstream: Gate<U>, on_next: F) -> Observer<T>
where
    T: 'static,
    U: 'static,
    F: Fn(&Gate<U>, T) + 'static,
{
    let next_gate = downstream.clone();
    let error_gate = downstream.clone();
    Observer::new()
        .on_next(move |value| on_next(&next_gate, value))
        .on_error(move |err| error_gate.error(err))
        .on_complete(move || downstream.complete())
}

impl<T: 'static> Stream<T> {
    /// Transform each value with a fallible projection.
    pub fn try_map<U, F>(&self, project: F) -> Stream<U>
    where
        U: 'static,
        F: Fn(T) -> Result<U, StreamError> + 'static,
    {
        let source = self.clone();
        let project = Rc::new(project);
        Stream::new(move |gate: Gate<U>| {
            let project = Rc::clone(&project);
            source.subscribe(relay(gate, move |gate, value| match project(value) {
                Ok(projected) => gate.next(projected),
                Err(err) => gate.error(err),
            }));
        })
    }

    /// Transform each value.
    pub fn map<U, F>(&self, project: F) -> Stream<U>
    where
        U: 'static,
        F: Fn(T) -> U + 'static,
    {
        self.try_map(move |value| Ok(project(value)))
    }

    /// Forward only values accepted by a fallible predicate.
    pub fn try_filter<P>(&self, predicate: P) -> Stream<T>
    where
        P: Fn(&T) -> Result<bool, StreamError> + 'static,
    {
        let source = self.clone();
        let predicate = Rc::new(predicate);
        Stream::new(move |gate: Gate<T>| {
            let predicate = Rc::clone(&predicate);
            source.subscribe(relay(gate, move |gate, value| match predicate(&value) {
                Ok(true) => gate.next(value),
                Ok(false) => {}
                Err(err) => gate.error(err),
            }));
        })
    }

    /// Forward only values matching `predicate`.
    pub fn filter<P>(&self, predicate: P) -> Stream<T>
    where
        P: Fn(&T) -> bool + 'static,
    {
        self.try_filter(move |value| Ok(predicate(value)))
    }

    /// Project values accepted by `predicate`; drop the rest.
    ///
    /// Either function failing routes to the error signal.
    pub fn try_filter_map<U, P, F>(&self, predicate: P, project: F) -> Stream<U>
    where
        U: 'static,
        P: Fn(&T) -> Result<bool, StreamError> + 'static,
        F: Fn(T) -> Result<U, StreamError> + 'static,
    {
        let source = self.clone();
        let predicate = Rc::new(predicate);
        let project = Rc::new(project);
        Stream::new(move |gate: Gate<U>| {
            let predicate = Rc::clone(&predicate);
            let project = Rc::clone(&project);
            source.subscribe(relay(gate, move |gate, value| match predicate(&value) {
                Ok(true) => match project(value) {
                    Ok(projected) => gate.next(projected),
                    Err(err) => gate.error(err),
                },
                Ok(false) => {}
                Err(err) => gate.error(err),
            }));
        })
    }

    /// Project values matching `predicate`; drop the rest.
    pub fn filter_map<U, P, F>(&self, predicate: P, project: F) -> Stream<U>
    where
        U: 'static,
        P: Fn(&T) -> bool + 'static,
        F: Fn(T) -> U + 'static,
    {
        self.try_filter_map(
            move |value| Ok(predicate(value)),
            move |value| Ok(project(value)),
        )
    }

    /// Run a fallible side effect for each value, forwarding it unchanged.
    pub fn try_tap<F>(&self, effect: F) -> Stream<T>
    where
        F: Fn(&T) -> Result<(), StreamError> + 'static,
    {
        let source = self.clone();
        let effect = Rc::new(effect);
        Stream::new(move |gate: Gate<T>| {
            let effect = Rc::clone(&effect);
            source.subscribe(relay(gate, move |gate, value| match effect(&value) {
                Ok(()) => gate.next(value),
                Err(err) => gate.error(err),
            }));
        })
    }

    /// Run a side effect for each value, forwarding it unchanged.
    pub fn tap<F>(&self, effect: F) -> Stream<T>
    where
        F: Fn(&T) + 'static,
    {
        self.try_tap(move |value| {
            effect(value);
            Ok(())
        })
    }

    /// Re-subscribe to the source when it fails.
    ///
    /// The attempt counter starts at 1 for each subscription. An error is
    /// propagated when `max_attempts` is 0 or the counter has reached
    /// `max_attempts`; otherwise the source is subscribed again. So
    /// `retry(0)` and `retry(1)` never retry, and `retry(n)` allows `n - 1`
    /// retries.
    ///
    /// # Example
    ///
    /// ```rust
    /// use rewind::stream::{Gate, Observer, Stream, StreamError};
    /// use std::cell::Cell;
    /// use std::rc::Rc;
    ///
    /// let runs = Rc::new(Cell::new(0));
    /// let counter = Rc::clone(&runs);
    /// let flaky = Stream::new(move |gate: Gate<&str>| {
    ///     counter.set(counter.get() + 1);
    ///     if counter.get() < 3 {
    ///         gate.error(StreamError::failed("not yet"));
    ///     } else {
    ///         gate.next("ok");
    ///         gate.complete();
    ///     }
    /// });
    ///
    /// let got = Rc::new(Cell::new(None));
    /// let sink = Rc::clone(&got);
    /// flaky.retry(3).subscribe(move |value| sink.set(Some(value)));
    ///
    /// assert_eq!(runs.get(), 3);
    /// assert_eq!(got.get(), Some("ok"));
    /// ```
    pub fn retry(&self, max_attempts: usize) -> Stream<T> {
        let source = self.clone();
        Stream::new(move |gate: Gate<T>| {
            drive_retries(&source, gate, Rc::new(RetryState::new()), max_attempts);
        })
    }
}

/// Retry bookkeeping shared by every attempt of one subscription.
struct RetryState {
    attempt: Cell<usize>,
    /// True while `drive_retries` is on the stack.
    driving: Cell<bool>,
    requested: Cell<bool>,
}

impl RetryState {
    fn new() -> Self {
        Self {
            attempt: Cell::new(1),
            driving: Cell::new(false),
            requested: Cell::new(false),
        }
    }
}

/// Subscribe to `source` until an attempt ends without requesting a retry.
///
/// Errors delivered synchronously only set `requested`, so the loop here
/// re-subscribes at constant stack depth. An error arriving after the loop
/// has returned starts a new loop from its own callback.
fn drive_retries<T: 'static>(
    source: &Stream<T>,
    gate: Gate<T>,
    state: Rc<RetryState>,
    max_attempts: usize,
) {
    loop {
        state.requested.set(false);
        state.driving.set(true);
        source.subscribe(retry_relay(source, &gate, &state, max_attempts));
        state.driving.set(false);
        if !state.requested.get() {
            break;
        }
    }
}

fn retry_relay<T: 'static>(
    source: &Stream<T>,
    gate: &Gate<T>,
    state: &Rc<RetryState>,
    max_attempts: usize,
) -> Observer<T> {
    let next_gate = gate.clone();
    let complete_gate = gate.clone();
    let gate = gate.clone();
    let state = Rc::clone(state);
    let source = source.clone();

    Observer::new()
        .on_next(move |value| next_gate.next(value))
        .on_complete(move || complete_gate.complete())
        .on_error(move |err| {
            let current = state.attempt.get();
            if max_attempts == 0 || current == max_attempts || gate.is_terminated() {
                gate.error(err);
                return;
            }
            state.attempt.set(current + 1);
            tracing::debug!(
                subscription = %gate.id(),
                attempt = current + 1,
                max_attempts,
                error = %err,
                "retrying stream"
            );
            if state.driving.get() {
                state.requested.set(true);
            } else {
                drive_retries(&source, gate.clone(), Rc::clone(&state), max_attempts);
            }
        })
}
