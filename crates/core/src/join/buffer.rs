// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pending-match buffer for one side of a join

use super::JoinKey;
use crate::record::DecodedRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// An unmatched record waiting for its counterpart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pending<T> {
    pub record: DecodedRecord<T>,
    /// Arrival sequence assigned by the join stage
    pub seq: u64,
}

/// Latest unmatched record per key, indexed by arrival order.
///
/// Holds at most one entry per key.
#[derive(Debug)]
pub struct PendingBuffer<T> {
    entries: HashMap<JoinKey, Pending<T>>,
    order: BTreeMap<u64, JoinKey>,
}

impl<T> Default for PendingBuffer<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            order: BTreeMap::new(),
        }
    }
}

impl<T> PendingBuffer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record, replacing any pending record for the same key.
    ///
    /// Returns the replaced record.
    pub fn insert(&mut self, key: JoinKey, record: DecodedRecord<T>, seq: u64) -> Option<Pending<T>> {
        self.order.insert(seq, key.clone());
        let replaced = self.entries.insert(key, Pending { record, seq });
        if let Some(old) = &replaced {
            self.order.remove(&old.seq);
        }
        replaced
    }

    /// Remove and return the pending record for `key`
    pub fn take(&mut self, key: &str) -> Option<Pending<T>> {
        let pending = self.entries.remove(key)?;
        self.order.remove(&pending.seq);
        Some(pending)
    }

    pub fn get(&self, key: &str) -> Option<&Pending<T>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The longest-waiting entry
    pub fn oldest(&self) -> Option<&Pending<T>> {
        let (_, key) = self.order.first_key_value()?;
        self.entries.get(key)
    }

    /// Remove the longest-waiting entry
    pub fn pop_oldest(&mut self) -> Option<(JoinKey, Pending<T>)> {
        let (_, key) = self.order.pop_first()?;
        let pending = self.entries.remove(&key)?;
        Some((key, pending))
    }

    /// Remove entries from the front while `expired` holds.
    ///
    /// Relies on timestamps being non-decreasing in arrival order, which
    /// holds for a single log partition.
    pub fn evict_while(&mut self, mut expired: impl FnMut(&Pending<T>) -> bool) -> usize {
        let mut evicted = 0;
        while let Some(oldest) = self.oldest() {
            if !expired(oldest) {
                break;
            }
            self.pop_oldest();
            evicted += 1;
        }
        evicted
    }

    /// Entries in arrival order
    pub fn iter(&self) -> impl Iterator<Item = (&JoinKey, &Pending<T>)> {
        self.order
            .values()
            .filter_map(|key| self.entries.get_key_value(key))
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
