//! Operators that await asynchronous work.
//!
//! Futures are spawned with [`tokio::task::spawn_local`], so subscribing to
//! any stream built with these operators must happen inside a
//! [`tokio::task::LocalSet`]. Disposing a subscription does not cancel a
//! spawned future; its result is discarded by the terminated gate.

use super::cold::Stream;
use super::error::StreamError;
use super::observer::{Gate, Observer};
use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use stillwater::effect::{BoxedEffect, Effect};

/// Bookkeeping for futures still running inside one `map_async` subscription.
#[derive(Default)]
struct InFlight {
    pending: Cell<usize>,
    source_completed: Cell<bool>,
}

impl InFlight {
    fn start(&self) {
        self.pending.set(self.pending.get() + 1);
    }

    /// Returns true when this was the last pending future and the source is done.
    fn settle(&self) -> bool {
        let left = self.pending.get().saturating_sub(1);
        self.pending.set(left);
        left == 0 && self.source_completed.get()
    }

    /// Returns true when completion can be forwarded right away.
    fn complete_source(&self) -> bool {
        self.source_completed.set(true);
        self.pending.get() == 0
    }
}

impl<T: 'static> Stream<T> {
    /// Map each value through an async function.
    ///
    /// Resolved values are forwarded on a later turn of the local task set;
    /// an `Err` routes to the error signal.
    ///
    /// Unlike the synchronous operators, completion is not relayed as soon
    /// as the source completes. It is held back until every spawned future
    /// has settled, so values still in flight are delivered before
    /// `complete` rather than dropped by the terminated gate.
    ///
    /// # Panics
    ///
    /// Subscribing panics outside a [`tokio::task::LocalSet`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use rewind::stream::{Observer, Stream, StreamError};
    /// use tokio::sync::mpsc;
    /// use tokio::task::LocalSet;
    ///
    /// # #[tokio::main(flavor = "current_thread")]
    /// # async fn main() {
    /// LocalSet::new()
    ///     .run_until(async {
    ///         let (tx, mut rx) = mpsc::unbounded_channel();
    ///         Stream::of([1, 2])
    ///             .map_async(|x| async move { Ok::<_, StreamError>(x * 10) })
    ///             .subscribe(Observer::new().on_next(move |x| {
    ///                 let _ = tx.send(x);
    ///             }));
    ///
    ///         assert_eq!(rx.recv().await, Some(10));
    ///         assert_eq!(rx.recv().await, Some(20));
    ///     })
    ///     .await;
    /// # }
    /// ```
    pub fn map_async<U, F, Fut>(&self, f: F) -> Stream<U>
    where
        U: 'static,
        F: Fn(T) -> Fut + 'static,
        Fut: Future<Output = Result<U, StreamError>> + 'static,
    {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::new(move |gate: Gate<U>| {
            let in_flight = Rc::new(InFlight::default());
            let f = Rc::clone(&f);
            let next_gate = gate.clone();
            let next_in_flight = Rc::clone(&in_flight);
            let error_gate = gate.clone();

            source.subscribe(
                Observer::new()
                    .on_next(move |value| {
                        let future = f(value);
                        let gate = next_gate.clone();
                        let in_flight = Rc::clone(&next_in_flight);
                        in_flight.start();
                        tokio::task::spawn_local(async move {
                            match future.await {
                                Ok(resolved) => gate.next(resolved),
                                Err(err) => gate.error(err),
                            }
                            if in_flight.settle() {
                                gate.complete();
                            }
                        });
                    })
                    .on_error(move |err| error_gate.error(err))
                    .on_complete(move || {
                        if in_flight.complete_source() {
                            gate.complete();
                        }
                    }),
            );
        })
    }

    /// Stream resolving a single future per subscription.
    ///
    /// `f` is called once for every subscription. The resolved value is
    /// emitted followed by completion; an `Err` routes to the error signal.
    ///
    /// # Panics
    ///
    /// Subscribing panics outside a [`tokio::task::LocalSet`].
    pub fn from_future<F, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = Result<T, StreamError>> + 'static,
    {
        Self::new(move |gate: Gate<T>| {
            let future = f();
            tokio::task::spawn_local(async move {
                match future.await {
                    Ok(value) => {
                        gate.next(value);
                        gate.complete();
                    }
                    Err(err) => gate.error(err),
                }
            });
        })
    }

    /// Stream running a stillwater effect per subscription.
    ///
    /// `factory` builds a fresh effect for every subscription, which is run
    /// against a clone of `env`. An effect error is delivered as
    /// [`StreamError::Rejected`].
    ///
    /// # Panics
    ///
    /// Subscribing panics outside a [`tokio::task::LocalSet`].
    pub fn from_effect<E, Env, F>(factory: F, env: Env) -> Self
    where
        T: Send,
        E: fmt::Display + Send + 'static,
        Env: Clone + Send + Sync + 'static,
        F: Fn() -> BoxedEffect<T, E, Env> + 'static,
    {
        Self::new(move |gate: Gate<T>| {
            let effect = factory();
            let env = env.clone();
            tokio::task::spawn_local(async move {
                match effect.run(&env).await {
                    Ok(value) => {
                        gate.next(value);
                        gate.complete();
                    }
                    Err(err) => gate.error(StreamError::rejected(err)),
                }
            });
        })
    }
}
