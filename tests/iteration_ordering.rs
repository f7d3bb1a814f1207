//! Iteration order tests
//!
//! Every matching document is delivered exactly once, in iteration-field
//! order, with 1-based ordinals, whatever the batch size.

use std::convert::Infallible;

use docbatch::batch::{BatchIterator, RunPhase, StopReason};
use docbatch::config::{BatchConfig, Direction, Projection};
use docbatch::filter::{Filter, FilterOp};
use docbatch::source::MemorySource;
use serde_json::{json, Value};

// =============================================================================
// Helper Functions
// =============================================================================

/// `n` documents with `_id` 1..=n, stored in scrambled order
fn scrambled(n: i64) -> MemorySource {
    let mut ids: Vec<i64> = (1..=n).collect();
    // Deterministic shuffle: interleave from both ends
    let mut order = Vec::with_capacity(ids.len());
    while !ids.is_empty() {
        order.push(ids.remove(0));
        if let Some(last) = ids.pop() {
            order.push(last);
        }
    }
    order
        .into_iter()
        .map(|i| json!({"_id": i, "group": if i % 2 == 0 { "even" } else { "odd" }}))
        .collect()
}

fn config(direction: i32, batch_size: u64) -> BatchConfig {
    BatchConfig::new()
        .with_iteration_field("_id", direction)
        .expect("valid iteration field")
        .with_batch_size(batch_size)
        .expect("valid batch size")
        .with_calc_count(false)
}

fn run(source: &MemorySource, config: BatchConfig) -> Vec<(i64, u64)> {
    let mut iterator = BatchIterator::new(source).with_config(config);
    let mut seen = Vec::new();
    iterator
        .execute(|doc, ordinal, _| {
            seen.push((doc["_id"].as_i64().expect("numeric _id"), ordinal));
            Ok::<(), Infallible>(())
        })
        .expect("run succeeds");
    seen
}

fn ids(seen: &[(i64, u64)]) -> Vec<i64> {
    seen.iter().map(|(id, _)| *id).collect()
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn test_ascending_visits_every_document_in_order() {
    let source = scrambled(37);
    for batch_size in [2, 3, 10, 37, 100] {
        let seen = run(&source, config(1, batch_size));
        assert_eq!(
            ids(&seen),
            (1..=37).collect::<Vec<_>>(),
            "batch size {}",
            batch_size
        );
    }
}

#[test]
fn test_descending_visits_every_document_in_reverse() {
    let source = scrambled(20);
    let seen = run(&source, config(-1, 7));
    assert_eq!(ids(&seen), (1..=20).rev().collect::<Vec<_>>());
}

#[test]
fn test_ordinals_are_one_based_and_contiguous() {
    let source = scrambled(12);
    let seen = run(&source, config(1, 5));
    let ordinals: Vec<u64> = seen.iter().map(|(_, ordinal)| *ordinal).collect();
    assert_eq!(ordinals, (1..=12).collect::<Vec<u64>>());
}

#[test]
fn test_direction_tokens_are_equivalent() {
    let source = scrambled(5);
    for direction in [json!(-1), json!("desc"), json!("DESCENDING")] {
        let config = BatchConfig::new()
            .with_iteration_field("_id", &direction)
            .expect("valid direction")
            .with_calc_count(false);
        assert_eq!(ids(&run(&source, config)), vec![5, 4, 3, 2, 1]);
    }
}

#[test]
fn test_empty_collection_completes_with_zero() {
    let source = MemorySource::new(Vec::new());
    let mut iterator = BatchIterator::new(&source).with_config(config(1, 2));
    let processed = iterator
        .execute(|_, _, _| Ok::<(), Infallible>(()))
        .expect("run succeeds");

    assert_eq!(processed, 0);
    assert_eq!(
        iterator.phase(),
        RunPhase::Completed(StopReason::Exhausted)
    );
}

// =============================================================================
// Filter and projection
// =============================================================================

#[test]
fn test_only_matching_documents_are_delivered() {
    let source = scrambled(10);
    let filter = Filter::all().with_eq("group", json!("even"));
    let seen = run(&source, config(1, 2).with_filter(filter));
    assert_eq!(ids(&seen), vec![2, 4, 6, 8, 10]);
}

#[test]
fn test_range_filter_on_iteration_field() {
    let source = scrambled(10);
    let filter = Filter::all()
        .with_op("_id", FilterOp::Gte(json!(3)))
        .with_op("_id", FilterOp::Lt(json!(6)));
    let seen = run(&source, config(-1, 2).with_filter(filter));
    assert_eq!(ids(&seen), vec![5, 4, 3]);
}

#[test]
fn test_projection_is_applied_to_delivered_documents() {
    let source = scrambled(3);
    let config = config(1, 2).with_projection(Projection::fields(["_id"]));
    let mut iterator = BatchIterator::new(&source).with_config(config);

    let mut docs: Vec<Value> = Vec::new();
    iterator
        .execute(|doc, _, _| {
            docs.push(doc.clone());
            Ok::<(), Infallible>(())
        })
        .expect("run succeeds");

    assert_eq!(docs, vec![json!({"_id": 1}), json!({"_id": 2}), json!({"_id": 3})]);
}

#[test]
fn test_string_iteration_field() {
    let source: MemorySource = ["2026-03-01", "2026-01-15", "2026-02-10"]
        .iter()
        .map(|d| json!({"_id": d, "created_at": d}))
        .collect();
    let config = BatchConfig::new()
        .with_iteration_field("created_at", Direction::Ascending)
        .expect("valid iteration field")
        .with_calc_count(false);

    let mut iterator = BatchIterator::new(&source).with_config(config);
    let mut dates = Vec::new();
    iterator
        .execute(|doc, _, _| {
            dates.push(doc["created_at"].as_str().unwrap_or_default().to_string());
            Ok::<(), Infallible>(())
        })
        .expect("run succeeds");

    assert_eq!(dates, vec!["2026-01-15", "2026-02-10", "2026-03-01"]);
}

#[test]
fn test_repeated_runs_without_checkpointing_rescan() {
    let source = scrambled(4);
    let mut iterator = BatchIterator::new(&source).with_config(config(1, 2));
    for _ in 0..2 {
        let processed = iterator
            .execute(|_, _, _| Ok::<(), Infallible>(()))
            .expect("run succeeds");
        assert_eq!(processed, 4);
    }
    assert_eq!(iterator.metrics().snapshot().runs_completed, 2);
}
