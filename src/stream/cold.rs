//! The cold stream type and its root constructors.

use super::error::StreamError;
use super::observer::{Disposable, Gate, Observer};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

type Producer<T> = Rc<dyn Fn(Gate<T>)>;

/// Lazy, push-based stream of values.
///
/// A stream only wraps a producer. Each call to [`subscribe`](Self::subscribe)
/// runs the producer again against a fresh [`Gate`]; nothing is shared or
/// cached between subscriptions.
///
/// # Example
///
/// ```rust
/// use rewind::stream::Stream;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let seen = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&seen);
///
/// Stream::of([1, 2, 3, 4, 5])
///     .map(|x| x + 1)
///     .filter(|x| x % 2 == 0)
///     .subscribe(move |x| sink.borrow_mut().push(x));
///
/// assert_eq!(*seen.borrow(), vec![2, 4, 6]);
/// ```
pub struct Stream<T> {
    producer: Producer<T>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            producer: Rc::clone(&self.producer),
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

impl<T: 'static> Stream<T> {
    /// Create a stream from a producer.
    ///
    /// The producer receives the subscription's gate and pushes signals into
    /// it, synchronously or from a spawned task.
    pub fn new<F>(producer: F) -> Self
    where
        F: Fn(Gate<T>) + 'static,
    {
        Self {
            producer: Rc::new(producer),
        }
    }

    /// Run the producer for a new subscription.
    ///
    /// Accepts an [`Observer`] or a bare `Fn(T)` used as the `next` callback.
    pub fn subscribe(&self, observer: impl Into<Observer<T>>) -> Disposable {
        let gate = Gate::new(observer.into());
        let disposable = gate.disposable();
        tracing::trace!(subscription = %gate.id(), "subscribing");
        (self.producer)(gate);
        disposable
    }

    /// Subscribe with separate `next`, `error` and `complete` callbacks.
    pub fn subscribe_with<N, E, C>(&self, next: N, error: E, complete: C) -> Disposable
    where
        N: Fn(T) + 'static,
        E: Fn(StreamError) + 'static,
        C: Fn() + 'static,
    {
        self.subscribe(
            Observer::new()
                .on_next(next)
                .on_error(error)
                .on_complete(complete),
        )
    }

    /// Stream that completes immediately without values.
    pub fn empty() -> Self {
        Self::new(|gate: Gate<T>| gate.complete())
    }

    /// Stream that fails immediately with `err`.
    pub fn fail(err: StreamError) -> Self {
        Self::new(move |gate: Gate<T>| gate.error(err.clone()))
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Emit each value in order, then complete.
    pub fn of<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let values: Rc<[T]> = values.into_iter().collect();
        Self::new(move |gate: Gate<T>| {
            for value in values.iter() {
                gate.next(value.clone());
            }
            gate.complete();
        })
    }
}

impl<T: Clone + 'static> FromIterator<T> for Stream<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::of(iter)
    }
}

impl Stream<Value> {
    /// Emit the elements of a JSON array, then complete.
    ///
    /// Any other JSON value, `null` included, is treated as an empty sequence.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::of(items),
            _ => Self::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::{Cell, RefCell};

    fn collect<T: Clone + 'static>(stream: &Stream<T>) -> (Vec<T>, bool) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let completed = Rc::new(Cell::new(false));
        let (sink, done) = (Rc::clone(&seen), Rc::clone(&completed));
        stream.subscribe(
            Observer::new()
                .on_next(move |value| sink.borrow_mut().push(value))
                .on_complete(move || done.set(true)),
        );
        let values = seen.borrow().clone();
        (values, completed.get())
    }

    #[test]
    fn subscribe_runs_producer() {
        let result = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&result);
        let stream = Stream::new(|gate: Gate<&str>| gate.next("it worked"));

        stream.subscribe(Observer::new().on_next(move |text| *sink.borrow_mut() = Some(text)));

        assert_eq!(*result.borrow(), Some("it worked"));
    }

    #[test]
    fn every_subscription_reruns_producer() {
        let runs = Rc::new(Cell::new(0));
        let counter = Rc::clone(&runs);
        let stream = Stream::new(move |gate: Gate<i32>| {
            counter.set(counter.get() + 1);
            gate.next(counter.get());
        });

        let seen = Rc::new(RefCell::new(Vec::new()));
        let (a, b) = (Rc::clone(&seen), Rc::clone(&seen));
        stream.subscribe(move |x| a.borrow_mut().push(x));
        stream.clone().subscribe(move |x| b.borrow_mut().push(x));

        assert_eq!(runs.get(), 2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }

    #[test]
    fn subscribe_with_three_callbacks() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (n, e, c) = (Rc::clone(&log), Rc::clone(&log), Rc::clone(&log));

        Stream::of([7]).subscribe_with(
            move |x: i32| n.borrow_mut().push(x.to_string()),
            move |err| e.borrow_mut().push(err.to_string()),
            move || c.borrow_mut().push("complete".to_string()),
        );

        assert_eq!(*log.borrow(), vec!["7", "complete"]);
    }

    #[test]
    fn of_emits_in_order_then_completes() {
        let (values, completed) = collect(&Stream::of(["a", "b", "c"]));
        assert_eq!(values, vec!["a", "b", "c"]);
        assert!(completed);
    }

    #[test]
    fn collect_into_stream() {
        let stream: Stream<i32> = vec![1, 2, 3, 4, 5].into_iter().collect();
        let (values, completed) = collect(&stream.map(|x| x + 1));
        assert_eq!(values, vec![2, 3, 4, 5, 6]);
        assert!(completed);
    }

    #[test]
    fn from_json_emits_array_elements() {
        let (values, completed) = collect(&Stream::from_json(json!([1, "two", null])));
        assert_eq!(values, vec![json!(1), json!("two"), json!(null)]);
        assert!(completed);
    }

    #[test]
    fn from_json_treats_non_arrays_as_empty() {
        for input in [json!({"a": 1}), json!("text"), json!(3)] {
            let (values, completed) = collect(&Stream::from_json(input));
            assert!(values.is_empty());
            assert!(completed);
        }
    }

    #[test]
    fn from_json_null_completes_without_error() {
        let errored = Rc::new(Cell::new(false));
        let flag = Rc::clone(&errored);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let completed = Rc::new(Cell::new(false));
        let (sink, done) = (Rc::clone(&seen), Rc::clone(&completed));

        Stream::from_json(Value::Null).subscribe(
            Observer::new()
                .on_next(move |value| sink.borrow_mut().push(value))
                .on_error(move |_| flag.set(true))
                .on_complete(move || done.set(true)),
        );

        assert!(seen.borrow().is_empty());
        assert!(completed.get());
        assert!(!errored.get());
    }

    #[test]
    fn empty_completes_immediately() {
        let (values, completed) = collect(&Stream::<i32>::empty());
        assert!(values.is_empty());
        assert!(completed);
    }

    #[test]
    fn fail_delivers_error() {
        let caught = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&caught);
        Stream::<i32>::fail(StreamError::failed("nope"))
            .subscribe(Observer::new().on_error(move |err| *sink.borrow_mut() = Some(err)));

        assert_eq!(*caught.borrow(), Some(StreamError::failed("nope")));
    }

    #[test]
    fn terminated_gate_drops_later_values() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let stream = Stream::new(|gate: Gate<i32>| {
            gate.next(1);
            gate.terminate();
            gate.next(2);
        });

        let sink = Rc::clone(&seen);
        let disposable = stream.subscribe(move |x| sink.borrow_mut().push(x));

        assert_eq!(*seen.borrow(), vec![1]);
        assert!(disposable.is_disposed());
    }
}
