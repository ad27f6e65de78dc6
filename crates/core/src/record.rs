// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log records and their decoded form

use serde::{Deserialize, Serialize};
use std::fmt;

/// A record read from a partitioned, offset-ordered log.
///
/// Records are produced by the log and never mutated by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub topic: String,
    pub partition: u32,
    /// Per-partition sequence number, never reused
    pub offset: u64,
    /// Log-assigned ingestion time (milliseconds since Unix epoch)
    pub timestamp: i64,
    pub key: Option<Vec<u8>>,
    /// `None` marks a tombstone
    pub value: Option<Vec<u8>>,
}

impl Record {
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Position of the record within its log
    pub fn meta(&self) -> RecordMeta {
        RecordMeta {
            topic: self.topic.clone(),
            partition: self.partition,
            offset: self.offset,
            timestamp: self.timestamp,
            key: self.key.clone(),
        }
    }

    /// Key as UTF-8 text, if present and valid
    pub fn key_str(&self) -> Option<&str> {
        self.key
            .as_deref()
            .and_then(|k| std::str::from_utf8(k).ok())
    }
}

/// Identity of a record, detached from its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordMeta {
    pub topic: String,
    pub partition: u32,
    pub offset: u64,
    pub timestamp: i64,
    pub key: Option<Vec<u8>>,
}

/// A record whose value has been parsed into `T`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedRecord<T> {
    pub meta: RecordMeta,
    pub value: T,
}

impl<T> DecodedRecord<T> {
    pub fn new(meta: RecordMeta, value: T) -> Self {
        Self { meta, value }
    }

    /// Replace the value, keeping the record identity
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> DecodedRecord<U> {
        DecodedRecord {
            meta: self.meta,
            value: f(self.value),
        }
    }
}

/// Where a subscription starts reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartPosition {
    /// Replay the full retained history
    Earliest,
    /// Only records appended after subscribing
    Latest,
    /// The next record read has this offset
    Offset(u64),
}

/// A single partition of a topic
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TopicPartition {
    pub topic: String,
    pub partition: u32,
}

impl TopicPartition {
    pub fn new(topic: impl Into<String>, partition: u32) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.topic, self.partition)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
