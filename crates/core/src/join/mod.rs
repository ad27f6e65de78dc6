// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stream-stream equi-join
//!
//! Two independent pending buffers, one per side. An arrival first looks
//! for an unmatched record with the same key on the opposite side:
//!
//! ```text
//! arrival(A, k) ──▶ B has k? ──yes──▶ emit (A, B), drop both entries
//!                       │
//!                       no ──▶ store A[k] (replacing any older A[k])
//! ```
//!
//! Each observation emits at most one combined record, so emissions follow
//! the order in which triggering arrivals were observed.
//!
//! Time is log time: the stage tracks the highest record timestamp seen
//! and evicts entries older than the retention window relative to it, so
//! replaying the same input yields the same evictions.
//!
//! [`JoinStage::snapshot`] captures both buffers with the log clock. A
//! stage restored from it continues exactly where the original left off.

mod buffer;

pub use buffer::{Pending, PendingBuffer};

use crate::record::DecodedRecord;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Correlation key shared by both sides
pub type JoinKey = String;

/// Which input a record arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

/// A decoded record arriving on one side of the join
#[derive(Debug, Clone)]
pub enum Arrival<L, R> {
    Left(DecodedRecord<L>),
    Right(DecodedRecord<R>),
}

impl<L, R> Arrival<L, R> {
    pub fn side(&self) -> Side {
        match self {
            Arrival::Left(_) => Side::Left,
            Arrival::Right(_) => Side::Right,
        }
    }

    fn timestamp(&self) -> i64 {
        match self {
            Arrival::Left(r) => r.meta.timestamp,
            Arrival::Right(r) => r.meta.timestamp,
        }
    }
}

/// Both matched records, kept whole
#[derive(Debug, Clone, PartialEq)]
pub struct Joined<L, R> {
    pub key: JoinKey,
    pub left: DecodedRecord<L>,
    pub right: DecodedRecord<R>,
}

/// Result of observing one arrival
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome<L, R> {
    Emit(Joined<L, R>),
    Buffered,
}

/// Retention and memory bounds for pending entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinConfig {
    /// Evict pending entries older than this; `None` keeps them forever
    pub retention: Option<Duration>,
    /// Cap on pending entries across both sides; `None` is unbounded
    pub max_pending: Option<usize>,
}

/// Lifetime counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub buffered: u64,
    pub matched: u64,
    pub replaced: u64,
    pub expired: u64,
    pub overflow_evicted: u64,
}

/// Pending entries and log clock of a [`JoinStage`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSnapshot<L, R> {
    /// Left entries in arrival order
    pub left: Vec<(JoinKey, Pending<L>)>,
    /// Right entries in arrival order
    pub right: Vec<(JoinKey, Pending<R>)>,
    pub watermark: i64,
    pub next_seq: u64,
}

/// Inner equi-join with emit-on-match and latest-wins buffering
pub struct JoinStage<L, R> {
    left: PendingBuffer<L>,
    right: PendingBuffer<R>,
    config: JoinConfig,
    watermark: i64,
    next_seq: u64,
    stats: JoinStats,
}

impl<L, R> JoinStage<L, R> {
    pub fn new(config: JoinConfig) -> Self {
        Self {
            left: PendingBuffer::new(),
            right: PendingBuffer::new(),
            config,
            watermark: i64::MIN,
            next_seq: 0,
            stats: JoinStats::default(),
        }
    }

    /// Observe an arrival with its extracted join key
    pub fn observe(&mut self, arrival: Arrival<L, R>, key: JoinKey) -> JoinOutcome<L, R> {
        self.watermark = self.watermark.max(arrival.timestamp());
        self.expire();

        let seq = self.next_seq;
        self.next_seq += 1;

        let replaced = match arrival {
            Arrival::Left(record) => {
                if let Some(pending) = self.right.take(&key) {
                    self.left.take(&key);
                    self.stats.matched += 1;
                    return JoinOutcome::Emit(Joined {
                        key,
                        left: record,
                        right: pending.record,
                    });
                }
                self.left.insert(key, record, seq).is_some()
            }
            Arrival::Right(record) => {
                if let Some(pending) = self.left.take(&key) {
                    self.right.take(&key);
                    self.stats.matched += 1;
                    return JoinOutcome::Emit(Joined {
                        key,
                        left: pending.record,
                        right: record,
                    });
                }
                self.right.insert(key, record, seq).is_some()
            }
        };

        self.stats.buffered += 1;
        if replaced {
            self.stats.replaced += 1;
        }
        self.enforce_capacity();
        // A late arrival may already be outside the window
        self.expire();
        JoinOutcome::Buffered
    }

    /// Whether a record for `key` is waiting on `side`
    pub fn is_pending(&self, side: Side, key: &str) -> bool {
        match side {
            Side::Left => self.left.contains(key),
            Side::Right => self.right.contains(key),
        }
    }

    /// Number of pending entries across both sides
    pub fn pending_len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    /// Copy of the pending state
    pub fn snapshot(&self) -> JoinSnapshot<L, R>
    where
        L: Clone,
        R: Clone,
    {
        JoinSnapshot {
            left: self
                .left
                .iter()
                .map(|(key, pending)| (key.clone(), pending.clone()))
                .collect(),
            right: self
                .right
                .iter()
                .map(|(key, pending)| (key.clone(), pending.clone()))
                .collect(),
            watermark: self.watermark,
            next_seq: self.next_seq,
        }
    }

    /// Replace the pending state with `snapshot`. Config and stats are kept.
    pub fn restore(&mut self, snapshot: JoinSnapshot<L, R>) {
        self.left = PendingBuffer::new();
        for (key, pending) in snapshot.left {
            self.left.insert(key, pending.record, pending.seq);
        }
        self.right = PendingBuffer::new();
        for (key, pending) in snapshot.right {
            self.right.insert(key, pending.record, pending.seq);
        }
        self.watermark = snapshot.watermark;
        // Never hand out a sequence number already held by an entry
        let held = self
            .left
            .iter()
            .map(|(_, p)| p.seq)
            .chain(self.right.iter().map(|(_, p)| p.seq))
            .max()
            .map_or(0, |seq| seq + 1);
        self.next_seq = snapshot.next_seq.max(held);
    }

    pub fn stats(&self) -> JoinStats {
        self.stats
    }

    fn expire(&mut self) {
        let Some(retention) = self.config.retention else {
            return;
        };
        let horizon = i64::try_from(retention.as_millis()).unwrap_or(i64::MAX);
        let cutoff = self.watermark.saturating_sub(horizon);
        let is_expired = |ts: i64| ts < cutoff;

        let evicted = self.left.evict_while(|p| is_expired(p.record.meta.timestamp))
            + self.right.evict_while(|p| is_expired(p.record.meta.timestamp));
        if evicted > 0 {
            tracing::debug!(evicted, cutoff, "expired pending join entries");
            self.stats.expired += evicted as u64;
        }
    }

    fn enforce_capacity(&mut self) {
        let Some(max) = self.config.max_pending else {
            return;
        };

        let mut evicted = 0usize;
        while self.pending_len() > max {
            let left_seq = self.left.oldest().map(|p| p.seq);
            let right_seq = self.right.oldest().map(|p| p.seq);
            let popped = match (left_seq, right_seq) {
                (Some(l), Some(r)) if r < l => self.right.pop_oldest().is_some(),
                (Some(_), _) => self.left.pop_oldest().is_some(),
                (None, Some(_)) => self.right.pop_oldest().is_some(),
                (None, None) => false,
            };
            if !popped {
                break;
            }
            evicted += 1;
        }

        if evicted > 0 {
            tracing::warn!(
                evicted,
                max_pending = max,
                "join buffer overflow, evicted oldest pending entries"
            );
            self.stats.overflow_evicted += evicted as u64;
        }
    }
}

#[cfg(test)]
#[path = "join_tests.rs"]
mod tests;
