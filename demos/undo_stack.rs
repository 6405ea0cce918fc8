//! Undo Stack
//!
//! This example drives a bounded history as the undo stack of a small
//! document editor.
//!
//! Key concepts:
//! - Recording snapshots with `push`
//! - Undo via `rollback`, retention via `with_limit`
//! - Path queries (`find`) and non-destructive edits (`update`)
//! - Frozen snapshots rejecting in-place mutation
//!
//! Run with: cargo run --example undo_stack

use rewind::core::{HistoryError, Path, StateHistory};
use serde_json::json;

fn main() -> Result<(), HistoryError> {
    println!("=== Undo Stack Example ===\n");

    let mut history = StateHistory::with_limit(4)?;
    history.push(json!({"doc": {"title": "Untitled", "words": 0}}));
    history.push(json!({"doc": {"title": "Notes", "words": 12}}));
    history.push(json!({"doc": {"title": "Notes", "words": 40}}));

    println!("Recorded {} snapshots", history.len());
    println!("  initial:  {}", history.initial());
    println!("  previous: {}", history.previous());
    println!("  current:  {}\n", history.current());

    println!("Fixing a typo in the current title without touching the past:");
    history.update(["doc", "title"], json!("Meeting notes"))?;
    println!("  current:  {}", history.current());
    println!("  previous: {}\n", history.previous());

    println!("Title over time:");
    for title in history.find(Path::parse("doc.title"))? {
        println!("  - {title}");
    }
    println!();

    println!("Undo:");
    if let Some(undone) = history.rollback() {
        println!("  dropped {undone}");
    }
    println!("  current is now {}", history.current());
    match history.modify_current(|doc| doc["doc"]["words"] = json!(0)) {
        Ok(_) => println!("  edited in place"),
        Err(err) => println!("  in-place edit refused: {err}\n"),
    }

    println!("Typing past the retention limit of {:?}:", history.limit());
    for words in [50, 60, 70, 80] {
        history.push(json!({"doc": {"title": "Meeting notes", "words": words}}));
    }
    println!("  kept {} snapshots, oldest is {}", history.len(), history.initial());
    if let Some(elapsed) = history.duration() {
        println!("  session span: {elapsed:?}\n");
    }

    println!("Reset to origin:");
    history.reset();
    println!("  {} snapshot left: {}", history.len(), history.current());

    println!("\n=== Example Complete ===");
    Ok(())
}
