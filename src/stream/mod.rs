//! Cold, push-based streams.
//!
//! A [`Stream`] is a recipe: nothing runs until [`Stream::subscribe`] is
//! called, and every subscription re-runs the producer from scratch.
//! Operators build new streams that subscribe to their source lazily.
//!
//! # Signals
//!
//! An observer receives zero or more `next` values followed by at most one
//! terminal signal, either `error` or `complete`. Each subscription is
//! fronted by a [`Gate`] which drops everything after the first terminal
//! signal or after [`Disposable::dispose`].
//!
//! # Async
//!
//! [`Stream::map_async`], [`Stream::from_future`] and [`Stream::from_effect`]
//! spawn work with `tokio::task::spawn_local` and must be subscribed inside a
//! `tokio::task::LocalSet`. Everything else is synchronous.

mod cold;
mod deferred;
mod error;
mod observer;
mod operators;

pub use cold::Stream;
pub use error::StreamError;
pub use observer::{Disposable, Gate, Observer, SubscriptionId};
