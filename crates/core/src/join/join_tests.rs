// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::record::RecordMeta;
use proptest::prelude::*;

type Stage = JoinStage<&'static str, f64>;

fn meta(topic: &str, offset: u64, timestamp: i64) -> RecordMeta {
    RecordMeta {
        topic: topic.to_string(),
        partition: 0,
        offset,
        timestamp,
        key: None,
    }
}

fn left(offset: u64, ts: i64, year: &'static str) -> Arrival<&'static str, f64> {
    Arrival::Left(DecodedRecord::new(meta("redis-server", offset, ts), year))
}

fn right(offset: u64, ts: i64, score: f64) -> Arrival<&'static str, f64> {
    Arrival::Right(DecodedRecord::new(meta("stedi-events", offset, ts), score))
}

fn unbounded() -> Stage {
    JoinStage::new(JoinConfig::default())
}

#[test]
fn left_then_right_emits_once() {
    let mut stage = unbounded();
    assert_eq!(stage.observe(left(0, 0, "1960"), "x@test.com".into()), JoinOutcome::Buffered);

    let JoinOutcome::Emit(joined) = stage.observe(right(0, 1, -0.5), "x@test.com".into()) else {
        panic!("expected a match");
    };
    assert_eq!(joined.key, "x@test.com");
    assert_eq!(joined.left.value, "1960");
    assert_eq!(joined.right.value, -0.5);

    // Both entries are consumed by the match
    assert_eq!(stage.pending_len(), 0);
    assert_eq!(
        stage.observe(right(1, 2, -1.0), "x@test.com".into()),
        JoinOutcome::Buffered
    );
}

#[test]
fn right_then_left_emits_in_left_right_order() {
    let mut stage = unbounded();
    stage.observe(right(0, 0, -2.0), "s@test.com".into());
    let JoinOutcome::Emit(joined) = stage.observe(left(0, 0, "1959"), "s@test.com".into()) else {
        panic!("expected a match");
    };
    assert_eq!(joined.left.value, "1959");
    assert_eq!(joined.right.value, -2.0);
}

#[test]
fn latest_pending_record_wins() {
    let mut stage = unbounded();
    stage.observe(left(0, 0, "1950"), "k@test.com".into());
    stage.observe(left(1, 0, "1951"), "k@test.com".into());
    assert_eq!(stage.pending_len(), 1);
    assert_eq!(stage.stats().replaced, 1);

    let JoinOutcome::Emit(joined) = stage.observe(right(0, 0, 1.0), "k@test.com".into()) else {
        panic!("expected a match");
    };
    assert_eq!(joined.left.value, "1951");
    assert_eq!(joined.left.meta.offset, 1);
}

#[test]
fn different_keys_do_not_match() {
    let mut stage = unbounded();
    stage.observe(left(0, 0, "1960"), "a@test.com".into());
    assert_eq!(stage.observe(right(0, 0, 0.0), "b@test.com".into()), JoinOutcome::Buffered);
    assert!(stage.is_pending(Side::Left, "a@test.com"));
    assert!(stage.is_pending(Side::Right, "b@test.com"));
}

#[test]
fn unmatched_entry_expires_after_retention() {
    let mut stage = JoinStage::new(JoinConfig {
        retention: Some(Duration::from_secs(10)),
        max_pending: None,
    });
    stage.observe(left(0, 1_000, "1960"), "x@test.com".into());

    // Another key moves log time past the horizon
    stage.observe(right(0, 12_000, 3.0), "other@test.com".into());
    assert!(!stage.is_pending(Side::Left, "x@test.com"));
    assert_eq!(stage.stats().expired, 1);

    // The late counterpart finds nothing
    assert_eq!(
        stage.observe(right(1, 12_500, -0.5), "x@test.com".into()),
        JoinOutcome::Buffered
    );
    assert_eq!(stage.stats().matched, 0);
}

#[test]
fn entry_within_retention_still_matches() {
    let mut stage = JoinStage::new(JoinConfig {
        retention: Some(Duration::from_secs(10)),
        max_pending: None,
    });
    stage.observe(left(0, 1_000, "1960"), "x@test.com".into());
    let outcome = stage.observe(right(0, 11_000, -0.5), "x@test.com".into());
    assert!(matches!(outcome, JoinOutcome::Emit(_)));
}

#[test]
fn no_retention_keeps_entries_forever() {
    let mut stage = unbounded();
    stage.observe(left(0, 0, "1960"), "x@test.com".into());
    stage.observe(right(0, i64::MAX / 2, 0.0), "y@test.com".into());
    assert!(stage.is_pending(Side::Left, "x@test.com"));
    assert_eq!(stage.stats().expired, 0);
}

#[test]
fn overflow_evicts_oldest_across_sides() {
    let mut stage = JoinStage::new(JoinConfig {
        retention: None,
        max_pending: Some(2),
    });
    stage.observe(left(0, 0, "a"), "a".into());
    stage.observe(right(0, 0, 1.0), "b".into());
    stage.observe(left(1, 0, "c"), "c".into());

    assert_eq!(stage.pending_len(), 2);
    assert!(!stage.is_pending(Side::Left, "a"));
    assert!(stage.is_pending(Side::Right, "b"));
    assert!(stage.is_pending(Side::Left, "c"));
    assert_eq!(stage.stats().overflow_evicted, 1);
}

#[test]
fn restored_stage_matches_like_the_original() {
    let mut original = unbounded();
    original.observe(left(0, 10, "1960"), "a".into());
    original.observe(left(1, 20, "1970"), "b".into());
    original.observe(right(0, 30, 2.0), "c".into());

    let snapshot = original.snapshot();
    assert_eq!(snapshot.left.len(), 2);
    assert_eq!(snapshot.left[0].0, "a");
    assert_eq!(snapshot.watermark, 30);
    assert_eq!(snapshot.next_seq, 3);

    let mut restored = unbounded();
    restored.restore(snapshot.clone());
    assert_eq!(restored.snapshot(), snapshot);

    let next = right(1, 40, 9.0);
    assert_eq!(
        original.observe(next.clone(), "b".into()),
        restored.observe(next, "b".into())
    );
    assert!(!restored.is_pending(Side::Left, "b"));
    assert!(restored.is_pending(Side::Right, "c"));
}

#[test]
fn restore_replaces_existing_entries() {
    let mut stage = unbounded();
    stage.observe(left(0, 0, "old"), "old".into());

    stage.restore(unbounded().snapshot());
    assert_eq!(stage.pending_len(), 0);
}

fn run(stage: &mut Stage, input: &[(bool, u8)]) -> Vec<(String, &'static str, u64)> {
    let mut emitted = Vec::new();
    for (i, (is_left, key)) in input.iter().enumerate() {
        let key = format!("k{key}");
        let arrival = if *is_left {
            left(i as u64, i as i64, "L")
        } else {
            right(i as u64, i as i64, i as f64)
        };
        if let JoinOutcome::Emit(j) = stage.observe(arrival, key) {
            emitted.push((j.key, j.left.value, j.right.meta.offset));
        }
    }
    emitted
}

proptest! {
    #[test]
    fn replay_of_same_input_is_deterministic(
        input in proptest::collection::vec((any::<bool>(), 0u8..4), 0..64),
        max_pending in proptest::option::of(1usize..6),
    ) {
        let config = JoinConfig { retention: Some(Duration::from_millis(8)), max_pending };
        let first = run(&mut JoinStage::new(config), &input);
        let second = run(&mut JoinStage::new(config), &input);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn at_most_one_pending_entry_per_side_and_key(
        input in proptest::collection::vec((any::<bool>(), 0u8..4), 0..64),
    ) {
        let mut stage = unbounded();
        run(&mut stage, &input);
        // Four keys, two sides, and a key is never pending on both sides
        prop_assert!(stage.pending_len() <= 4);
        for key in 0..4u8 {
            let key = format!("k{key}");
            prop_assert!(!(stage.is_pending(Side::Left, &key) && stage.is_pending(Side::Right, &key)));
        }
    }
}
