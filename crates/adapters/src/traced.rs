// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::broker::{BrokerAdapter, BrokerError, Delivery};
use async_trait::async_trait;
use tracing::Instrument;
use trib_core::StartPosition;

/// Wrapper that adds tracing to any BrokerAdapter
#[derive(Clone)]
pub struct TracedBroker<B> {
    inner: B,
}

impl<B> TracedBroker<B> {
    pub fn new(inner: B) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }
}

#[async_trait]
impl<B: BrokerAdapter> BrokerAdapter for TracedBroker<B> {
    type Subscription = B::Subscription;

    async fn subscribe(
        &self,
        topic: &str,
        partition: u32,
        start: StartPosition,
    ) -> Result<B::Subscription, BrokerError> {
        let span = tracing::info_span!("broker.subscribe", topic, partition);
        let result = self
            .inner
            .subscribe(topic, partition, start)
            .instrument(span.clone())
            .await;

        let _guard = span.enter();
        match &result {
            Ok(_) => tracing::info!(?start, "subscribed"),
            Err(e) => tracing::error!(?start, error = %e, "subscribe failed"),
        }
        result
    }

    async fn publish(
        &self,
        topic: &str,
        key: Option<Vec<u8>>,
        value: Option<Vec<u8>>,
    ) -> Result<Delivery, BrokerError> {
        let span = tracing::info_span!("broker.publish", topic);

        let value_len = value.as_ref().map(Vec::len);
        let start = std::time::Instant::now();
        let result = self
            .inner
            .publish(topic, key, value)
            .instrument(span.clone())
            .await;
        let elapsed = start.elapsed();

        let _guard = span.enter();

        match &result {
            Ok(delivery) => tracing::debug!(
                partition = delivery.partition,
                offset = delivery.offset,
                value_len,
                elapsed_ms = elapsed.as_millis() as u64,
                "published"
            ),
            Err(e) => tracing::warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "publish failed"
            ),
        }
        result
    }

    async fn ensure_topic(
        &self,
        name: &str,
        partitions: u32,
        replicas: u32,
    ) -> Result<bool, BrokerError> {
        let span = tracing::info_span!("broker.ensure_topic", name, partitions, replicas);

        // Precondition: a topic needs at least one partition and replica
        if partitions == 0 || replicas == 0 {
            let _guard = span.enter();
            tracing::error!("partitions and replicas must be at least 1");
            return Err(BrokerError::InvalidTopic(format!(
                "{name}: partitions and replicas must be at least 1"
            )));
        }

        let start = std::time::Instant::now();
        let result = self
            .inner
            .ensure_topic(name, partitions, replicas)
            .instrument(span.clone())
            .await;
        let elapsed = start.elapsed();

        let _guard = span.enter();

        match &result {
            Ok(true) => tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "topic exists"),
            Ok(false) => tracing::info!(elapsed_ms = elapsed.as_millis() as u64, "topic created"),
            Err(e) => tracing::error!(
                elapsed_ms = elapsed.as_millis() as u64,
                error = %e,
                "provisioning failed"
            ),
        }
        result
    }

    async fn partition_count(&self, topic: &str) -> Result<Option<u32>, BrokerError> {
        let span = tracing::debug_span!("broker.partition_count", topic);
        let result = self
            .inner
            .partition_count(topic)
            .instrument(span.clone())
            .await;

        let _guard = span.enter();
        match &result {
            Ok(partitions) => tracing::debug!(?partitions, "partition count"),
            Err(e) => tracing::warn!(error = %e, "partition count failed"),
        }
        result
    }
}

#[cfg(test)]
#[path = "traced_tests.rs"]
mod tests;
