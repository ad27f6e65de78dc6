// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log broker adapters

mod file;

pub use file::{FileBroker, FileSubscription, TopicSpec};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{BrokerCall, FakeBroker, FakeSubscription};

use async_trait::async_trait;
use thiserror::Error;
use trib_core::{Record, StartPosition, TopicPartition};
use trib_storage::StorageError;

/// Errors from broker operations
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("unknown topic: {0}")]
    UnknownTopic(String),
    #[error("invalid topic: {0}")]
    InvalidTopic(String),
    #[error("partition {partition} out of range for {topic} ({partitions} partitions)")]
    PartitionOutOfRange {
        topic: String,
        partition: u32,
        partitions: u32,
    },
    #[error("broker unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Acknowledgement of a published record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    pub partition: u32,
    pub offset: u64,
}

/// Pick a partition for a record key
pub fn partition_for(key: Option<&[u8]>, partitions: u32) -> u32 {
    match key {
        Some(key) if partitions > 1 => crc32fast::hash(key) % partitions,
        _ => 0,
    }
}

/// An ordered, restartable read of one topic partition.
///
/// `poll` returns `Ok(None)` when no record is available yet; the caller
/// decides whether to wait and poll again.
#[async_trait]
pub trait Subscription: Send + 'static {
    async fn poll(&mut self) -> Result<Option<Record>, BrokerError>;

    /// Offset of the next record `poll` will return
    fn position(&self) -> u64;

    fn topic_partition(&self) -> &TopicPartition;
}

/// Adapter for an append-only, partitioned log
#[async_trait]
pub trait BrokerAdapter: Clone + Send + Sync + 'static {
    type Subscription: Subscription;

    /// Open a subscription on one partition
    async fn subscribe(
        &self,
        topic: &str,
        partition: u32,
        start: StartPosition,
    ) -> Result<Self::Subscription, BrokerError>;

    /// Append a record; `value = None` publishes a tombstone
    async fn publish(
        &self,
        topic: &str,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    ) -> Result<Delivery, BrokerError>;

    /// Make sure a topic exists; returns whether it already existed
    async fn ensure_topic(
        &self,
        name: &str,
        partitions: u32,
        replicas: u32,
    ) -> Result<bool, BrokerError>;

    /// Partition count of a topic, `None` if it does not exist
    async fn partition_count(&self, topic: &str) -> Result<Option<u32>, BrokerError>;
}

#[cfg(test)]
#[path = "broker_tests.rs"]
mod tests;
