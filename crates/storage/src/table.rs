// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized key-value table built from a changelog

use std::collections::BTreeMap;

/// One change to a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableUpdate<K, V> {
    Upsert { key: K, value: V },
    Delete { key: K },
}

impl<K, V> TableUpdate<K, V> {
    pub fn key(&self) -> &K {
        match self {
            TableUpdate::Upsert { key, .. } | TableUpdate::Delete { key } => key,
        }
    }
}

/// Latest value per key, updated in log order.
///
/// Applying the same sequence of updates always yields the same table, so a
/// table can be rebuilt from its changelog at any time.
#[derive(Debug, Clone)]
pub struct MaterializedTable<K, V> {
    name: String,
    rows: BTreeMap<K, V>,
    applied: u64,
}

impl<K: Ord, V> MaterializedTable<K, V> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
            applied: 0,
        }
    }

    /// Build a table by applying `updates` in order
    pub fn rebuild(name: impl Into<String>, updates: impl IntoIterator<Item = TableUpdate<K, V>>) -> Self {
        let mut table = Self::new(name);
        for update in updates {
            table.apply(update);
        }
        table
    }

    pub fn apply(&mut self, update: TableUpdate<K, V>) {
        match update {
            TableUpdate::Upsert { key, value } => {
                self.rows.insert(key, value);
            }
            TableUpdate::Delete { key } => {
                self.rows.remove(&key);
            }
        }
        self.applied += 1;
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.rows.get(key)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in key order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.rows.iter()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of updates applied since creation
    pub fn applied(&self) -> u64 {
        self.applied
    }
}

#[cfg(test)]
#[path = "table_tests.rs"]
mod tests;
