// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline driver: the single-threaded processing loop
//!
//! ```text
//! inputs (round-robin) ──▶ Stage::process ──▶ Sink::write (retried) ──▶ checkpoint
//! ```
//!
//! Each pass over the inputs takes at most one record from every input, in
//! the stage's declared input order. A record is fully written before its
//! offset is checkpointed, and the stop signal is only honored between
//! records, so the committed position is always gap-free.
//!
//! The stage's snapshot is committed in the same write as the positions.
//! On start the driver restores it, so a record consumed before a restart
//! is never read again once its commit lands.

use crate::error::{DriverError, StageError};
use crate::provision::ProvisionedTopics;
use crate::retry::RetryPolicy;
use crate::sink::Sink;
use crate::stage::{Change, Stage};
use std::time::Duration;
use tokio::sync::watch;
use tracing::Instrument;
use trib_adapters::{BrokerAdapter, Subscription};
use trib_core::{PipelineConfig, Record, StartPosition, TopicPartition};
use trib_storage::CheckpointStore;

/// Driver settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Partition this instance owns on every input
    pub partition: u32,
    /// Where to start an input with no checkpoint
    pub start: StartPosition,
    pub idle_poll_interval: Duration,
    pub retry: RetryPolicy,
    /// Return once every input is exhausted instead of waiting for more
    pub drain: bool,
}

impl DriverConfig {
    pub fn from_pipeline(config: &PipelineConfig) -> Self {
        Self {
            partition: config.partition,
            start: config.starting_offset_policy.start_position(),
            idle_poll_interval: config.idle_poll_interval,
            retry: RetryPolicy::from_config(config),
            drain: false,
        }
    }

    pub fn drain(mut self, drain: bool) -> Self {
        self.drain = drain;
        self
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::from_pipeline(&PipelineConfig::default())
    }
}

/// Counters reported when the driver stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverStats {
    /// Records read from inputs
    pub processed: u64,
    /// Records skipped because they could not be decoded
    pub skipped: u64,
    /// Changes written to the sink
    pub emitted: u64,
    /// Sink write retries
    pub retries: u64,
}

/// Owns one stage, one sink and the checkpoint for one pipeline instance
pub struct Driver<B, S, K> {
    broker: B,
    stage: S,
    sink: K,
    checkpoints: CheckpointStore,
    provisioned: ProvisionedTopics,
    config: DriverConfig,
    stats: DriverStats,
}

impl<B, S, K> Driver<B, S, K>
where
    B: BrokerAdapter,
    S: Stage,
    K: Sink<S::Output>,
{
    pub fn new(
        broker: B,
        stage: S,
        sink: K,
        checkpoints: CheckpointStore,
        provisioned: ProvisionedTopics,
        config: DriverConfig,
    ) -> Self {
        Self {
            broker,
            stage,
            sink,
            checkpoints,
            provisioned,
            config,
            stats: DriverStats::default(),
        }
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn checkpoints(&self) -> &CheckpointStore {
        &self.checkpoints
    }

    pub fn stats(&self) -> DriverStats {
        self.stats
    }

    /// Run until stopped, drained (in drain mode) or failed
    pub async fn run(&mut self, stop: watch::Receiver<bool>) -> Result<DriverStats, DriverError> {
        let span = tracing::info_span!("driver", pipeline = self.stage.name());
        let result = self.run_loop(stop).instrument(span.clone()).await;

        let _guard = span.enter();
        match &result {
            Ok(stats) => tracing::info!(
                processed = stats.processed,
                skipped = stats.skipped,
                emitted = stats.emitted,
                retries = stats.retries,
                "pipeline stopped"
            ),
            Err(e) => tracing::error!(error = %e, "pipeline failed"),
        }
        result
    }

    async fn run_loop(&mut self, mut stop: watch::Receiver<bool>) -> Result<DriverStats, DriverError> {
        for request in self.sink.topics() {
            self.provisioned.ensure(&self.broker, &request).await?;
        }

        self.sink.restore().await.map_err(DriverError::Restore)?;

        if let Some(state) = self.checkpoints.state().cloned() {
            self.stage.restore(state).map_err(DriverError::Stage)?;
            tracing::info!("stage state restored");
        }

        let mut inputs = Vec::new();
        for topic in self.stage.inputs().to_vec() {
            let tp = TopicPartition::new(&topic, self.config.partition);
            let start = match self.checkpoints.position(&tp) {
                Some(next) => StartPosition::Offset(next),
                None => self.config.start,
            };
            tracing::info!(%tp, ?start, "subscribing");
            inputs.push(self.broker.subscribe(&topic, tp.partition, start).await?);
        }

        loop {
            if *stop.borrow() {
                tracing::info!("stop requested");
                break;
            }

            let mut progressed = false;
            for input in 0..inputs.len() {
                if *stop.borrow() {
                    break;
                }
                let Some(record) = inputs[input].poll().await? else {
                    continue;
                };
                progressed = true;
                self.handle(input, record).await?;
                self.commit(&inputs)?;
            }

            if progressed {
                continue;
            }
            if self.config.drain {
                tracing::info!("inputs drained");
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.idle_poll_interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() {
                        tracing::info!("stop handle dropped");
                        break;
                    }
                }
            }
        }

        Ok(self.stats)
    }

    async fn handle(&mut self, input: usize, record: Record) -> Result<(), DriverError> {
        self.stats.processed += 1;

        let changes = match self.stage.process(input, &record) {
            Ok(changes) => changes,
            Err(StageError::Decode(e)) => {
                tracing::warn!(
                    topic = %record.topic,
                    partition = record.partition,
                    offset = record.offset,
                    error = %e,
                    "skipping record"
                );
                self.stats.skipped += 1;
                return Ok(());
            }
            Err(e) => return Err(DriverError::Stage(e)),
        };

        for change in &changes {
            self.write(change).await?;
            self.stats.emitted += 1;
        }
        Ok(())
    }

    async fn write(&mut self, change: &Change<S::Output>) -> Result<(), DriverError> {
        let retry = self.config.retry;
        let mut attempt = 1;
        loop {
            let err = match self.sink.write(change).await {
                Ok(()) => return Ok(()),
                Err(e) => e,
            };
            if !err.is_transient() {
                return Err(DriverError::SinkRejected(err));
            }
            if attempt >= retry.limit {
                return Err(DriverError::SinkUnavailable {
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = retry.delay(attempt);
            tracing::warn!(
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "sink write failed, retrying"
            );
            self.stats.retries += 1;
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    /// Persist every input's resume point with the stage snapshot
    fn commit(&mut self, inputs: &[B::Subscription]) -> Result<(), DriverError> {
        let state = self.stage.snapshot().map_err(DriverError::Stage)?;
        let positions = inputs
            .iter()
            .map(|subscription| (subscription.topic_partition(), subscription.position()));
        self.checkpoints.commit_all(positions, state)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
