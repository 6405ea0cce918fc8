//! Property-based tests for history and stream invariants.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use proptest::prelude::*;
use rewind::core::{Path, StateHistory};
use rewind::stream::{Gate, Observer, Stream, StreamError};
use serde_json::{json, Value};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Operation applied to a history during a random run.
#[derive(Clone, Debug)]
enum Op {
    Push(i32),
    Shift,
    Pop,
    Reset,
}

prop_compose! {
    fn arbitrary_op()(variant in 0..10u8, value in any::<i32>()) -> Op {
        match variant {
            0..=5 => Op::Push(value),
            6 => Op::Shift,
            7 | 8 => Op::Pop,
            _ => Op::Reset,
        }
    }
}

prop_compose! {
    fn titled_snapshot()(title in prop::option::of("[a-z]{0,6}")) -> Value {
        match title {
            Some(title) => json!({"doc": {"title": title}}),
            None => json!({"doc": {}}),
        }
    }
}

fn apply(history: &mut StateHistory<i32>, op: &Op) {
    match op {
        Op::Push(value) => history.push(*value),
        Op::Shift => {
            history.shift();
        }
        Op::Pop => {
            history.pop();
        }
        Op::Reset => history.reset(),
    }
}

fn collect<T: 'static>(stream: &Stream<T>) -> Vec<T> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    stream.subscribe(move |value| sink.borrow_mut().push(value));
    seen.take()
}

proptest! {
    #[test]
    fn forward_and_backward_walks_mirror(ops in prop::collection::vec(arbitrary_op(), 0..64)) {
        let mut history = StateHistory::new();
        for op in &ops {
            apply(&mut history, op);
        }

        let forward: Vec<i32> = history.iter().copied().collect();
        let mut backward: Vec<i32> = history.iter().rev().copied().collect();
        backward.reverse();

        prop_assert_eq!(forward.len(), history.len());
        prop_assert_eq!(&forward, &backward);
        prop_assert_eq!(history.is_empty(), history.get_current().is_none());
        if history.len() == 1 {
            prop_assert_eq!(history.get_current(), history.get_initial());
        }
    }

    #[test]
    fn limit_bounds_length_and_keeps_newest(
        limit in 1usize..8,
        values in prop::collection::vec(any::<i32>(), 0..40)
    ) {
        let mut history = StateHistory::with_limit(limit).unwrap();
        for value in &values {
            history.push(*value);
            prop_assert!(history.len() <= limit);
        }

        let kept: Vec<i32> = history.iter().copied().collect();
        let expected: Vec<i32> = values[values.len().saturating_sub(limit)..].to_vec();
        prop_assert_eq!(kept, expected);
    }

    #[test]
    fn shift_drains_oldest_first(values in prop::collection::vec(any::<i32>(), 0..32)) {
        let mut history = StateHistory::new();
        for value in &values {
            history.push(*value);
        }

        let drained: Vec<i32> = std::iter::from_fn(|| history.shift()).collect();
        prop_assert_eq!(drained, values);
        prop_assert!(history.is_empty());
    }

    #[test]
    fn pop_drains_newest_first(values in prop::collection::vec(any::<i32>(), 0..32)) {
        let mut history = StateHistory::new();
        for value in &values {
            history.push(*value);
        }

        let drained: Vec<i32> = std::iter::from_fn(|| history.pop()).collect();
        let mut expected = values;
        expected.reverse();
        prop_assert_eq!(drained, expected);
    }

    #[test]
    fn only_newest_snapshot_is_unfrozen(values in prop::collection::vec(any::<i32>(), 1..16)) {
        let mut history = StateHistory::new();
        for value in &values {
            history.push(*value);
        }

        let frozen: Vec<bool> = history.entries().map(|entry| entry.frozen).collect();
        let (last, earlier) = frozen.split_last().unwrap();
        prop_assert!(!last);
        prop_assert!(earlier.iter().all(|f| *f));
    }

    #[test]
    fn find_keeps_order_and_skips_falsy(snapshots in prop::collection::vec(titled_snapshot(), 0..16)) {
        let mut history = StateHistory::new();
        for snapshot in &snapshots {
            history.push(snapshot.clone());
        }

        let expected: Vec<Value> = snapshots
            .iter()
            .filter_map(|s| s["doc"].get("title"))
            .filter(|title| title.as_str() != Some(""))
            .cloned()
            .collect();
        prop_assert_eq!(history.find(Path::parse("doc.title")).unwrap(), expected);
    }

    #[test]
    fn serde_round_trip_preserves_snapshots(
        limit in prop::option::of(1usize..6),
        values in prop::collection::vec(any::<i32>(), 0..20)
    ) {
        let mut history = match limit {
            Some(limit) => StateHistory::with_limit(limit).unwrap(),
            None => StateHistory::new(),
        };
        for value in &values {
            history.push(*value);
        }

        let encoded = serde_json::to_string(&history).unwrap();
        let decoded: StateHistory<i32> = serde_json::from_str(&encoded).unwrap();

        prop_assert_eq!(decoded.limit(), history.limit());
        prop_assert_eq!(
            decoded.iter().collect::<Vec<_>>(),
            history.iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn map_and_filter_match_iterators(values in prop::collection::vec(any::<i16>(), 0..32)) {
        let stream = Stream::of(values.clone())
            .map(|x| i32::from(x) * 3)
            .filter(|x| x % 2 == 0);

        let expected: Vec<i32> = values
            .iter()
            .map(|x| i32::from(*x) * 3)
            .filter(|x| x % 2 == 0)
            .collect();
        prop_assert_eq!(collect(&stream), expected);
    }

    #[test]
    fn every_subscription_replays_all_values(values in prop::collection::vec(any::<u8>(), 0..16)) {
        let stream: Stream<u8> = values.iter().copied().collect();
        prop_assert_eq!(collect(&stream), values.clone());
        prop_assert_eq!(collect(&stream), values);
    }

    #[test]
    fn retry_subscribes_at_most_max_attempts(max_attempts in 0usize..8) {
        let runs = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&runs);
        let source = Stream::new(move |gate: Gate<i32>| {
            counter.set(counter.get() + 1);
            gate.error(StreamError::failed("always"));
        });

        let errors = Rc::new(Cell::new(0usize));
        let sink = Rc::clone(&errors);
        source
            .retry(max_attempts)
            .subscribe(Observer::new().on_error(move |_| sink.set(sink.get() + 1)));

        prop_assert_eq!(runs.get(), max_attempts.max(1));
        prop_assert_eq!(errors.get(), 1);
    }
}
