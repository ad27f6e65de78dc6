// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sinks: where a pipeline's changes end up
//!
//! - [`TopicSink`] publishes each change to an output topic
//! - [`TableSink`] publishes to a changelog, then applies to an in-memory
//!   table that can be rebuilt from that changelog
//! - [`ConsoleSink`] renders changes as text tables

use crate::error::SinkError;
use crate::provision::TopicRequest;
use crate::stage::Change;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::io::Write;
use std::marker::PhantomData;
use std::str::FromStr;
use trib_adapters::console::{batch_header, render_table};
use trib_adapters::{BrokerAdapter, Subscription};
use trib_core::{Codec, JsonCodec, Keyed, Record, StartPosition, Tabular};
use trib_storage::{MaterializedTable, TableUpdate};

/// Destination for stage output
#[async_trait]
pub trait Sink<O: Send + Sync>: Send {
    /// Topics that must exist before the first write
    fn topics(&self) -> Vec<TopicRequest> {
        Vec::new()
    }

    /// Rebuild in-memory state before processing; returns records replayed
    async fn restore(&mut self) -> Result<u64, SinkError> {
        Ok(0)
    }

    /// Durably write one change. The driver retries transient failures.
    async fn write(&mut self, change: &Change<O>) -> Result<(), SinkError>;
}

/// Publishes changes to an output topic, keyed by the value's record key
pub struct TopicSink<B, O> {
    broker: B,
    topic: String,
    codec: JsonCodec<O>,
}

impl<B, O> TopicSink<B, O> {
    pub fn new(broker: B, topic: impl Into<String>) -> Self {
        Self {
            broker,
            topic: topic.into(),
            codec: JsonCodec::new(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

#[async_trait]
impl<B, O> Sink<O> for TopicSink<B, O>
where
    B: BrokerAdapter,
    O: Keyed + Serialize + DeserializeOwned + Send + Sync,
{
    fn topics(&self) -> Vec<TopicRequest> {
        vec![TopicRequest::single(&self.topic)]
    }

    async fn write(&mut self, change: &Change<O>) -> Result<(), SinkError> {
        let (key, value) = match change {
            Change::Upsert(record) => (
                record.value.record_key(),
                Some(self.codec.encode(&record.value)),
            ),
            Change::Delete { key } => (Some(key.clone()), None),
        };
        self.broker.publish(&self.topic, key, value).await?;
        Ok(())
    }
}

/// Changelog-backed materialized table.
///
/// Every change is published to the changelog before the in-memory table
/// is updated, so a restart never loses an update a reader has seen.
pub struct TableSink<B, K, V> {
    broker: B,
    changelog: String,
    table: MaterializedTable<K, V>,
    codec: JsonCodec<V>,
}

impl<B, K, V> TableSink<B, K, V>
where
    K: FromStr + Ord,
{
    pub fn new(broker: B, table: impl Into<String>, changelog: impl Into<String>) -> Self {
        Self {
            broker,
            changelog: changelog.into(),
            table: MaterializedTable::new(table),
            codec: JsonCodec::new(),
        }
    }

    pub fn table(&self) -> &MaterializedTable<K, V> {
        &self.table
    }

    pub fn into_table(self) -> MaterializedTable<K, V> {
        self.table
    }

    pub fn changelog(&self) -> &str {
        &self.changelog
    }

    fn parse_key(&self, bytes: &[u8]) -> Result<K, SinkError> {
        let invalid = || SinkError::InvalidKey {
            sink: self.table.name().to_string(),
            key: String::from_utf8_lossy(bytes).into_owned(),
        };
        let text = std::str::from_utf8(bytes).map_err(|_| invalid())?;
        text.parse().map_err(|_| invalid())
    }

    /// Apply one changelog record, skipping records that cannot be read
    fn replay(&mut self, record: &Record)
    where
        V: Serialize + DeserializeOwned,
    {
        let Some(key_bytes) = record.key.as_deref() else {
            tracing::warn!(
                partition = record.partition,
                offset = record.offset,
                "changelog record without key, skipping"
            );
            return;
        };
        let key = match self.parse_key(key_bytes) {
            Ok(key) => key,
            Err(e) => {
                tracing::warn!(offset = record.offset, error = %e, "skipping changelog record");
                return;
            }
        };
        match record.value.as_deref() {
            None => self.table.apply(TableUpdate::Delete { key }),
            Some(bytes) => match self.codec.decode(bytes) {
                Ok(value) => self.table.apply(TableUpdate::Upsert { key, value }),
                Err(e) => {
                    tracing::warn!(offset = record.offset, error = %e, "skipping changelog record")
                }
            },
        }
    }
}

#[async_trait]
impl<B, K, V> Sink<V> for TableSink<B, K, V>
where
    B: BrokerAdapter,
    K: FromStr + Ord + Display + Send + Sync,
    V: Keyed + Serialize + DeserializeOwned + Clone + Send + Sync,
{
    fn topics(&self) -> Vec<TopicRequest> {
        vec![TopicRequest::single(&self.changelog)]
    }

    /// Replays every changelog partition. Each key lives on one partition,
    /// so per-key order is preserved.
    async fn restore(&mut self) -> Result<u64, SinkError> {
        let partitions = self
            .broker
            .partition_count(&self.changelog)
            .await?
            .unwrap_or(0);

        let mut replayed = 0;
        for partition in 0..partitions {
            let mut changelog = self
                .broker
                .subscribe(&self.changelog, partition, StartPosition::Earliest)
                .await?;
            while let Some(record) = changelog.poll().await? {
                replayed += 1;
                self.replay(&record);
            }
        }

        tracing::info!(
            table = self.table.name(),
            changelog = %self.changelog,
            partitions,
            replayed,
            entries = self.table.len(),
            "table restored"
        );
        Ok(replayed)
    }

    async fn write(&mut self, change: &Change<V>) -> Result<(), SinkError> {
        match change {
            Change::Upsert(record) => {
                let key_bytes = record.value.record_key().ok_or_else(|| SinkError::MissingKey {
                    sink: self.table.name().to_string(),
                })?;
                let key = self.parse_key(&key_bytes)?;
                let value = self.codec.encode(&record.value);
                self.broker
                    .publish(&self.changelog, Some(key_bytes), Some(value))
                    .await?;
                tracing::debug!(table = self.table.name(), %key, "upsert");
                self.table.apply(TableUpdate::Upsert {
                    key,
                    value: record.value.clone(),
                });
            }
            Change::Delete { key: key_bytes } => {
                let key = self.parse_key(key_bytes)?;
                self.broker
                    .publish(&self.changelog, Some(key_bytes.clone()), None)
                    .await?;
                tracing::debug!(table = self.table.name(), %key, "delete");
                self.table.apply(TableUpdate::Delete { key });
            }
        }
        Ok(())
    }
}

/// Prints each change as a one-row table batch
pub struct ConsoleSink<W, O> {
    out: W,
    batch: u64,
    _row: PhantomData<fn(O)>,
}

impl<O> ConsoleSink<std::io::Stdout, O> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W, O> ConsoleSink<W, O> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            batch: 0,
            _row: PhantomData,
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }
}

#[async_trait]
impl<W, O> Sink<O> for ConsoleSink<W, O>
where
    W: Write + Send,
    O: Tabular + Send + Sync,
{
    async fn write(&mut self, change: &Change<O>) -> Result<(), SinkError> {
        let body = match change {
            Change::Upsert(record) => render_table(O::columns(), &[record.value.row()]),
            Change::Delete { key } => format!("tombstone {}\n", String::from_utf8_lossy(key)),
        };
        self.out.write_all(batch_header(self.batch).as_bytes())?;
        self.out.write_all(body.as_bytes())?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        self.batch += 1;
        Ok(())
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
