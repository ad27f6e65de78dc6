// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topics a driver has made sure exist

use crate::error::DriverError;
use std::collections::HashSet;
use trib_adapters::BrokerAdapter;

/// A topic a sink needs before its first write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicRequest {
    pub name: String,
    pub partitions: u32,
    pub replicas: u32,
}

impl TopicRequest {
    /// Single partition, single replica
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partitions: 1,
            replicas: 1,
        }
    }
}

/// Names already ensured by this driver instance; each topic is checked
/// with the broker at most once
#[derive(Debug, Default)]
pub struct ProvisionedTopics {
    ensured: HashSet<String>,
}

impl ProvisionedTopics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ensured.contains(name)
    }

    pub fn len(&self) -> usize {
        self.ensured.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ensured.is_empty()
    }

    /// Ensure the topic exists; any failure is fatal for startup
    pub async fn ensure<B: BrokerAdapter>(
        &mut self,
        broker: &B,
        request: &TopicRequest,
    ) -> Result<(), DriverError> {
        if self.ensured.contains(&request.name) {
            return Ok(());
        }

        let existed = broker
            .ensure_topic(&request.name, request.partitions, request.replicas)
            .await
            .map_err(|source| DriverError::TopicProvision {
                topic: request.name.clone(),
                source,
            })?;

        tracing::info!(
            topic = %request.name,
            partitions = request.partitions,
            existed,
            "topic provisioned"
        );
        self.ensured.insert(request.name.clone());
        Ok(())
    }
}

#[cfg(test)]
#[path = "provision_tests.rs"]
mod tests;
