// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory broker for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{partition_for, BrokerAdapter, BrokerError, Delivery, Subscription};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use trib_core::{Clock, FakeClock, Record, StartPosition, TopicPartition};

/// Recorded broker call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCall {
    Subscribe {
        topic: String,
        partition: u32,
        start: StartPosition,
    },
    Publish {
        topic: String,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    },
    EnsureTopic {
        name: String,
        partitions: u32,
        replicas: u32,
    },
}

#[derive(Default)]
struct FakeTopic {
    replicas: u32,
    partitions: Vec<Vec<Record>>,
}

#[derive(Default)]
struct FakeState {
    topics: HashMap<String, FakeTopic>,
    calls: Vec<BrokerCall>,
    publish_failures: u32,
    provision_failures: HashSet<String>,
}

/// Fake broker: in-memory partitions plus call recording and fault injection
#[derive(Clone, Default)]
pub struct FakeBroker {
    state: Arc<Mutex<FakeState>>,
    clock: FakeClock,
}

impl FakeBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that stamps published records
    pub fn clock(&self) -> &FakeClock {
        &self.clock
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<BrokerCall> {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .calls
            .clone()
    }

    /// Fail the next `count` publishes with `Unavailable`
    pub fn fail_publishes(&self, count: u32) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .publish_failures = count;
    }

    /// Make `ensure_topic` fail for this name
    pub fn fail_provision(&self, name: &str) {
        self.state
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .provision_failures
            .insert(name.to_string());
    }

    /// Append a record directly, creating a single-partition topic if needed.
    ///
    /// Bypasses call recording and fault injection.
    pub fn append(&self, topic: &str, key: Option<&[u8]>, value: Option<&[u8]>) -> u64 {
        let timestamp = self.clock.now_millis();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let entry = state
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| FakeTopic {
                replicas: 1,
                partitions: vec![Vec::new()],
            });
        let partition = partition_for(key, entry.partitions.len() as u32);
        push(
            entry,
            topic,
            partition,
            timestamp,
            key.map(<[u8]>::to_vec),
            value.map(<[u8]>::to_vec),
        )
    }

    /// Every record in one partition
    pub fn records(&self, topic: &str, partition: u32) -> Vec<Record> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .topics
            .get(topic)
            .and_then(|t| t.partitions.get(partition as usize))
            .cloned()
            .unwrap_or_default()
    }

    /// Values of every record in one partition, as UTF-8
    pub fn values(&self, topic: &str, partition: u32) -> Vec<Option<String>> {
        self.records(topic, partition)
            .into_iter()
            .map(|r| r.value.map(|v| String::from_utf8_lossy(&v).into_owned()))
            .collect()
    }

    /// Partition count and replica count, if the topic exists
    pub fn topic(&self, name: &str) -> Option<(u32, u32)> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state
            .topics
            .get(name)
            .map(|t| (t.partitions.len() as u32, t.replicas))
    }
}

fn push(
    topic: &mut FakeTopic,
    name: &str,
    partition: u32,
    timestamp: i64,
    key: Option<Vec<u8>>,
    value: Option<Vec<u8>>,
) -> u64 {
    let log = &mut topic.partitions[partition as usize];
    let offset = log.len() as u64;
    log.push(Record {
        topic: name.to_string(),
        partition,
        offset,
        timestamp,
        key,
        value,
    });
    offset
}

#[async_trait]
impl BrokerAdapter for FakeBroker {
    type Subscription = FakeSubscription;

    async fn subscribe(
        &self,
        topic: &str,
        partition: u32,
        start: StartPosition,
    ) -> Result<FakeSubscription, BrokerError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(BrokerCall::Subscribe {
            topic: topic.to_string(),
            partition,
            start,
        });

        let len = match state.topics.get(topic) {
            Some(t) if partition as usize >= t.partitions.len() => {
                return Err(BrokerError::PartitionOutOfRange {
                    topic: topic.to_string(),
                    partition,
                    partitions: t.partitions.len() as u32,
                });
            }
            Some(t) => t.partitions[partition as usize].len() as u64,
            None => 0,
        };

        let next = match start {
            StartPosition::Earliest => 0,
            StartPosition::Latest => len,
            StartPosition::Offset(offset) => offset,
        };

        Ok(FakeSubscription {
            state: Arc::clone(&self.state),
            tp: TopicPartition::new(topic, partition),
            next,
        })
    }

    async fn publish(
        &self,
        topic: &str,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    ) -> Result<Delivery, BrokerError> {
        let timestamp = self.clock.now_millis();
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(BrokerCall::Publish {
            topic: topic.to_string(),
            key: key.clone(),
            value: value.clone(),
        });

        if state.publish_failures > 0 {
            state.publish_failures -= 1;
            return Err(BrokerError::Unavailable("injected publish failure".to_string()));
        }

        let Some(entry) = state.topics.get_mut(topic) else {
            return Err(BrokerError::UnknownTopic(topic.to_string()));
        };
        let partition = partition_for(key.as_deref(), entry.partitions.len() as u32);
        let offset = push(entry, topic, partition, timestamp, key, value);
        Ok(Delivery { partition, offset })
    }

    async fn ensure_topic(
        &self,
        name: &str,
        partitions: u32,
        replicas: u32,
    ) -> Result<bool, BrokerError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.calls.push(BrokerCall::EnsureTopic {
            name: name.to_string(),
            partitions,
            replicas,
        });

        if state.provision_failures.contains(name) {
            return Err(BrokerError::Unavailable(format!(
                "injected provisioning failure for {name}"
            )));
        }
        if partitions == 0 || replicas == 0 {
            return Err(BrokerError::InvalidTopic(name.to_string()));
        }
        if state.topics.contains_key(name) {
            return Ok(true);
        }

        state.topics.insert(
            name.to_string(),
            FakeTopic {
                replicas,
                partitions: (0..partitions).map(|_| Vec::new()).collect(),
            },
        );
        Ok(false)
    }

    async fn partition_count(&self, topic: &str) -> Result<Option<u32>, BrokerError> {
        Ok(self.topic(topic).map(|(partitions, _)| partitions))
    }
}

/// Cursor over a fake partition
pub struct FakeSubscription {
    state: Arc<Mutex<FakeState>>,
    tp: TopicPartition,
    next: u64,
}

#[async_trait]
impl Subscription for FakeSubscription {
    async fn poll(&mut self) -> Result<Option<Record>, BrokerError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let record = state
            .topics
            .get(&self.tp.topic)
            .and_then(|t| t.partitions.get(self.tp.partition as usize))
            .and_then(|log| log.get(self.next as usize))
            .cloned();
        if let Some(record) = &record {
            self.next = record.offset + 1;
        }
        Ok(record)
    }

    fn position(&self) -> u64 {
        self.next
    }

    fn topic_partition(&self) -> &TopicPartition {
        &self.tp
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
