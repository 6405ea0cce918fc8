//! Stream Pipeline
//!
//! This example builds cold stream pipelines, including async stages that
//! run on a tokio `LocalSet`.
//!
//! Key concepts:
//! - Streams are lazy and re-run per subscription
//! - Fallible operators route failures to the error signal
//! - `retry` re-subscribes to a failing source
//! - Async stages (`map_async`, `from_future`) and the history adapter
//!
//! Run with: cargo run --example stream_pipeline

use rewind::adapter::to_snapshot_stream;
use rewind::core::StateHistory;
use rewind::stream::{Gate, Observer, Stream, StreamError};
use rewind::stream_of;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::LocalSet;

fn printer<T: std::fmt::Debug + 'static>(label: &'static str) -> Observer<T> {
    Observer::new()
        .on_next(move |value| println!("  [{label}] next {value:?}"))
        .on_error(move |err| println!("  [{label}] error: {err}"))
        .on_complete(move || println!("  [{label}] complete"))
}

fn synchronous_pipelines() {
    println!("Synchronous operators:");
    let numbers = stream_of![1, 2, 3, 4, 5];
    numbers
        .map(|x| x * 10)
        .filter(|x| *x > 20)
        .tap(|x| println!("  [tap] saw {x}"))
        .subscribe(printer("scaled"));

    numbers
        .try_map(|x| {
            if x == 3 {
                Err(StreamError::failed("three is not allowed"))
            } else {
                Ok(x)
            }
        })
        .subscribe(printer("guarded"));

    println!("\nRetrying a flaky source:");
    let attempts = Rc::new(Cell::new(0));
    let counter = Rc::clone(&attempts);
    Stream::new(move |gate: Gate<&str>| {
        counter.set(counter.get() + 1);
        if counter.get() < 3 {
            gate.error(StreamError::failed(format!("attempt {}", counter.get())));
        } else {
            gate.next("connected");
            gate.complete();
        }
    })
    .retry(3)
    .subscribe(printer("flaky"));
    println!("  source ran {} times\n", attempts.get());
}

async fn async_pipelines() {
    println!("Async stages:");
    let (tx, mut rx) = mpsc::unbounded_channel();
    let done = tx.clone();

    stream_of![30u64, 10, 20]
        .map_async(|delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            Ok::<_, StreamError>(format!("slept {delay}ms"))
        })
        .subscribe(
            Observer::new()
                .on_next(move |msg| {
                    let _ = tx.send(Some(msg));
                })
                .on_complete(move || {
                    let _ = done.send(None);
                }),
        );

    while let Some(Some(msg)) = rx.recv().await {
        println!("  [map_async] {msg}");
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    Stream::from_future(|| async { Ok::<_, StreamError>("profile loaded") })
        .subscribe(move |msg| {
            let _ = tx.send(msg);
        });
    if let Some(msg) = rx.recv().await {
        println!("  [from_future] {msg}\n");
    }
}

fn history_adapter() {
    println!("History replay:");
    let mut history = StateHistory::new();
    for step in ["draft", "review", "publish"] {
        history.push(step.to_string());
    }
    to_snapshot_stream(&history.into_shared())
        .map(|step| step.to_uppercase())
        .subscribe(printer("history"));
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("=== Stream Pipeline Example ===\n");

    synchronous_pipelines();
    LocalSet::new().run_until(async_pipelines()).await;
    history_adapter();

    println!("\n=== Example Complete ===");
}
