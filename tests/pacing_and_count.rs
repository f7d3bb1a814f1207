//! Pacing and count precomputation tests
//!
//! - With batch size B and pause P, N documents take at least floor(N/B) * P
//! - Without count precomputation the total stays unknown throughout and the
//!   run still ends on exhaustion or limit
//! - With it, every callback sees the same total and the run stops there

use std::convert::Infallible;
use std::time::{Duration, Instant};

use docbatch::batch::{BatchIterator, PacingPolicy, RunPhase, StopReason};
use docbatch::checkpoint::{CheckpointStore, MemoryCheckpointStore};
use docbatch::config::BatchConfig;
use docbatch::source::MemorySource;
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn numbered(n: i64) -> MemorySource {
    (1..=n).map(|i| json!({"_id": i})).collect()
}

fn config(calc_count: bool) -> BatchConfig {
    BatchConfig::new()
        .with_iteration_field("_id", 1)
        .expect("valid iteration field")
        .with_calc_count(calc_count)
}

fn totals(source: &MemorySource, config: BatchConfig) -> (Vec<Option<u64>>, RunPhase) {
    let mut iterator = BatchIterator::new(source).with_config(config);
    let mut seen = Vec::new();
    iterator
        .execute(|_, _, total| {
            seen.push(total);
            Ok::<(), Infallible>(())
        })
        .expect("run succeeds");
    (seen, iterator.phase())
}

// =============================================================================
// Pacing
// =============================================================================

#[test]
fn test_pacing_lower_bound_on_elapsed_time() {
    let pause = Duration::from_millis(15);
    let batch_size = 4;
    let n = 13;
    let source = numbered(n);
    let config = config(false)
        .with_batch_size(batch_size)
        .expect("valid batch size")
        .with_pause(pause);
    let mut iterator = BatchIterator::new(&source).with_config(config);

    let started = Instant::now();
    let processed = iterator
        .execute(|_, _, _| Ok::<(), Infallible>(()))
        .expect("run succeeds");
    let elapsed = started.elapsed();

    assert_eq!(processed, 13);
    let minimum = PacingPolicy::new(batch_size, pause).minimum_pause_for(processed);
    assert_eq!(minimum, pause * 3);
    assert!(elapsed >= minimum, "elapsed {:?} < {:?}", elapsed, minimum);
    assert_eq!(iterator.metrics().snapshot().pacing_pauses, 3);
}

#[test]
fn test_pacing_applies_with_known_total() {
    let pause = Duration::from_millis(10);
    let source = numbered(6);
    let config = config(true)
        .with_batch_size(3)
        .expect("valid batch size")
        .with_pause(pause);
    let mut iterator = BatchIterator::new(&source).with_config(config);

    let started = Instant::now();
    iterator
        .execute(|_, _, _| Ok::<(), Infallible>(()))
        .expect("run succeeds");

    assert!(started.elapsed() >= pause * 2);
    assert_eq!(iterator.metrics().snapshot().pacing_pauses, 2);
    assert_eq!(
        iterator.phase(),
        RunPhase::Completed(StopReason::CountReached)
    );
}

/// The last document's pause is taken even though the cursor is then empty.
#[test]
fn test_pause_after_final_document_on_exhaustion() {
    let pause = Duration::from_millis(10);
    let source = numbered(4);
    let config = config(false)
        .with_batch_size(2)
        .expect("valid batch size")
        .with_pause(pause);
    let mut iterator = BatchIterator::new(&source).with_config(config);

    let started = Instant::now();
    iterator
        .execute(|_, _, _| Ok::<(), Infallible>(()))
        .expect("run succeeds");

    assert!(started.elapsed() >= pause * 2);
    assert_eq!(iterator.metrics().snapshot().pacing_pauses, 2);
    assert_eq!(
        iterator.phase(),
        RunPhase::Completed(StopReason::Exhausted)
    );
}

#[test]
fn test_zero_pause_never_suspends() {
    let source = numbered(50);
    let config = config(false).with_batch_size(2).expect("valid batch size");
    let mut iterator = BatchIterator::new(&source).with_config(config);
    iterator
        .execute(|_, _, _| Ok::<(), Infallible>(()))
        .expect("run succeeds");
    assert_eq!(iterator.metrics().snapshot().pacing_pauses, 0);
}

#[test]
fn test_pause_follows_the_checkpoint_write() {
    let source = numbered(4);
    let store = MemoryCheckpointStore::new();
    let config = config(false)
        .with_batch_size(2)
        .expect("valid batch size")
        .with_pause(Duration::from_millis(5))
        .with_save_state(true);
    let mut iterator = BatchIterator::new(&source)
        .with_config(config)
        .with_checkpoint_store(&store);

    let mut positions_seen = Vec::new();
    iterator
        .execute(|_, _, _| {
            // Position stored before this callback: the previous document's
            positions_seen.push(store.get("docbatch:_id:1").expect("readable"));
            Ok::<(), Infallible>(())
        })
        .expect("run succeeds");

    assert_eq!(
        positions_seen,
        vec![None, Some(json!(1)), Some(json!(2)), Some(json!(3))]
    );
    assert_eq!(store.get("docbatch:_id:1").unwrap(), Some(json!(4)));
}

// =============================================================================
// Count precomputation
// =============================================================================

#[test]
fn test_count_disabled_total_unknown_until_exhaustion() {
    let source = numbered(5);
    let (seen, phase) = totals(&source, config(false));
    assert_eq!(seen, vec![None; 5]);
    assert_eq!(phase, RunPhase::Completed(StopReason::Exhausted));
}

#[test]
fn test_count_disabled_total_unknown_until_limit() {
    let source = numbered(10);
    let (seen, phase) = totals(&source, config(false).with_limit(3).unwrap());
    assert_eq!(seen, vec![None; 3]);
    assert_eq!(phase, RunPhase::Completed(StopReason::LimitReached));
}

#[test]
fn test_count_enabled_reports_total() {
    let source = numbered(4);
    let (seen, phase) = totals(&source, config(true));
    assert_eq!(seen, vec![Some(4); 4]);
    assert_eq!(phase, RunPhase::Completed(StopReason::CountReached));
}

#[test]
fn test_count_honours_limit() {
    let source = numbered(10);
    let (seen, _) = totals(&source, config(true).with_limit(6).unwrap());
    assert_eq!(seen, vec![Some(6); 6]);
}

#[test]
fn test_count_honours_resume_position() {
    let source = numbered(10);
    let store = MemoryCheckpointStore::seeded("docbatch:_id:1", json!(7));
    let mut iterator = BatchIterator::new(&source)
        .with_config(config(true).with_save_state(true))
        .with_checkpoint_store(&store);

    let mut seen = Vec::new();
    iterator
        .execute(|doc, ordinal, total| {
            seen.push((doc["_id"].as_i64().unwrap_or_default(), ordinal, total));
            Ok::<(), Infallible>(())
        })
        .expect("run succeeds");

    assert_eq!(seen, vec![(8, 1, Some(3)), (9, 2, Some(3)), (10, 3, Some(3))]);
}

#[test]
fn test_count_of_empty_result() {
    let source = numbered(0);
    let (seen, phase) = totals(&source, config(true));
    assert!(seen.is_empty());
    assert_eq!(phase, RunPhase::Completed(StopReason::Exhausted));
}
