// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broker backed by segment files in a local directory
//!
//! ```text
//! <root>/<topic>/topic.json     partitions and replicas
//! <root>/<topic>/<n>.log        one segment per partition
//! ```
//!
//! Several processes may share a root: appends are serialized by the
//! segment file lock and readers only see complete, checksummed lines.

use super::{partition_for, BrokerAdapter, BrokerError, Delivery, Subscription};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use trib_core::{Clock, Record, StartPosition, SystemClock, TopicPartition};
use trib_storage::segment::end_offset;
use trib_storage::{SegmentCursor, SegmentWriter, StorageError};

const TOPIC_FILE: &str = "topic.json";

/// Topic metadata stored next to its segments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSpec {
    pub partitions: u32,
    /// Recorded for parity with replicated brokers; a local directory has
    /// no replicas
    pub replicas: u32,
}

/// File-backed broker
#[derive(Clone)]
pub struct FileBroker<C: Clock = SystemClock> {
    root: PathBuf,
    clock: C,
    writers: Arc<Mutex<HashMap<TopicPartition, SegmentWriter>>>,
}

impl FileBroker<SystemClock> {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_clock(root, SystemClock)
    }
}

impl<C: Clock> FileBroker<C> {
    pub fn with_clock(root: impl Into<PathBuf>, clock: C) -> Self {
        Self {
            root: root.into(),
            clock,
            writers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn topic_dir(&self, topic: &str) -> PathBuf {
        self.root.join(topic)
    }

    fn segment_path(&self, topic: &str, partition: u32) -> PathBuf {
        self.topic_dir(topic).join(format!("{partition}.log"))
    }

    /// Metadata for a topic, or `None` if it has not been created
    pub fn topic_spec(&self, topic: &str) -> Result<Option<TopicSpec>, BrokerError> {
        validate_topic_name(topic)?;
        let path = self.topic_dir(topic).join(TOPIC_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path).map_err(StorageError::from)?;
        let spec = serde_json::from_str(&content).map_err(StorageError::from)?;
        Ok(Some(spec))
    }

    /// Names of every topic under the root
    pub fn topics(&self) -> Result<Vec<String>, BrokerError> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root).map_err(StorageError::from)? {
            let entry = entry.map_err(StorageError::from)?;
            if entry.path().join(TOPIC_FILE).exists() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn create_topic(&self, name: &str, spec: TopicSpec) -> Result<bool, BrokerError> {
        let dir = self.topic_dir(name);
        std::fs::create_dir_all(&dir).map_err(StorageError::from)?;

        // Write to a private temp file, then link it into place: the link
        // fails if another process created the topic first.
        let tmp = dir.join(format!("{TOPIC_FILE}.{}.tmp", std::process::id()));
        let content = serde_json::to_vec_pretty(&spec).map_err(StorageError::from)?;
        std::fs::write(&tmp, content).map_err(StorageError::from)?;
        let linked = std::fs::hard_link(&tmp, dir.join(TOPIC_FILE));
        let _ = std::fs::remove_file(&tmp);

        match linked {
            Ok(()) => Ok(false),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(true),
            Err(e) => Err(StorageError::from(e).into()),
        }
    }
}

fn validate_topic_name(name: &str) -> Result<(), BrokerError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(BrokerError::InvalidTopic(name.to_string()))
    }
}

#[async_trait]
impl<C: Clock + 'static> BrokerAdapter for FileBroker<C> {
    type Subscription = FileSubscription;

    async fn subscribe(
        &self,
        topic: &str,
        partition: u32,
        start: StartPosition,
    ) -> Result<FileSubscription, BrokerError> {
        // An absent topic is read as empty until something creates it
        if let Some(spec) = self.topic_spec(topic)? {
            if partition >= spec.partitions {
                return Err(BrokerError::PartitionOutOfRange {
                    topic: topic.to_string(),
                    partition,
                    partitions: spec.partitions,
                });
            }
        }

        let path = self.segment_path(topic, partition);
        let next = match start {
            StartPosition::Earliest => 0,
            StartPosition::Latest => end_offset(&path)?,
            StartPosition::Offset(offset) => offset,
        };

        Ok(FileSubscription {
            tp: TopicPartition::new(topic, partition),
            cursor: SegmentCursor::new(&path, next),
        })
    }

    async fn publish(
        &self,
        topic: &str,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    ) -> Result<Delivery, BrokerError> {
        let spec = self
            .topic_spec(topic)?
            .ok_or_else(|| BrokerError::UnknownTopic(topic.to_string()))?;
        let partition = partition_for(key.as_deref(), spec.partitions);
        let tp = TopicPartition::new(topic, partition);

        let mut writers = self.writers.lock().unwrap_or_else(|e| e.into_inner());
        let writer = match writers.entry(tp) {
            std::collections::hash_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::hash_map::Entry::Vacant(entry) => {
                let writer = SegmentWriter::open(&self.segment_path(topic, partition))?;
                entry.insert(writer)
            }
        };

        let offset = writer.append(self.clock.now_millis(), key, value)?;
        Ok(Delivery { partition, offset })
    }

    async fn ensure_topic(
        &self,
        name: &str,
        partitions: u32,
        replicas: u32,
    ) -> Result<bool, BrokerError> {
        validate_topic_name(name)?;
        if partitions == 0 || replicas == 0 {
            return Err(BrokerError::InvalidTopic(format!(
                "{name}: partitions and replicas must be at least 1"
            )));
        }

        if let Some(existing) = self.topic_spec(name)? {
            if existing.partitions != partitions {
                tracing::warn!(
                    topic = name,
                    existing = existing.partitions,
                    requested = partitions,
                    "topic exists with a different partition count"
                );
            }
            return Ok(true);
        }

        self.create_topic(
            name,
            TopicSpec {
                partitions,
                replicas,
            },
        )
    }

    async fn partition_count(&self, topic: &str) -> Result<Option<u32>, BrokerError> {
        Ok(self.topic_spec(topic)?.map(|spec| spec.partitions))
    }
}

/// Subscription over one partition's segment file
pub struct FileSubscription {
    tp: TopicPartition,
    cursor: SegmentCursor,
}

#[async_trait]
impl Subscription for FileSubscription {
    async fn poll(&mut self) -> Result<Option<Record>, BrokerError> {
        let Some(entry) = self.cursor.next_entry()? else {
            return Ok(None);
        };
        Ok(Some(Record {
            topic: self.tp.topic.clone(),
            partition: self.tp.partition,
            offset: entry.offset,
            timestamp: entry.timestamp,
            key: entry.key,
            value: entry.value,
        }))
    }

    fn position(&self) -> u64 {
        self.cursor.next_offset()
    }

    fn topic_partition(&self) -> &TopicPartition {
        &self.tp
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
