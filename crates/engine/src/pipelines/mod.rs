// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The three concrete pipelines and how each is wired into a driver

pub mod birthdays;
pub mod customer_risk;
pub mod stations;

use crate::driver::{Driver, DriverConfig, DriverStats};
use crate::error::DriverError;
use crate::provision::ProvisionedTopics;
use crate::sink::{ConsoleSink, TopicSink};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tokio::sync::watch;
use trib_adapters::BrokerAdapter;
use trib_core::PipelineConfig;
use trib_storage::CheckpointStore;

pub use customer_risk::CustomerRiskStage;
pub use stations::{StationsStage, StationsTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    /// Station events to the `transformed_stations` table
    Stations,
    /// Redis customer records to printed email and birth year rows
    CustomerBirthdays,
    /// Risk scores joined with birth years, published to the output topic
    CustomerRisk,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 3] = [
        PipelineKind::Stations,
        PipelineKind::CustomerBirthdays,
        PipelineKind::CustomerRisk,
    ];

    /// Stable name, also used as the checkpoint file stem
    pub fn name(&self) -> &'static str {
        match self {
            PipelineKind::Stations => "stations",
            PipelineKind::CustomerBirthdays => "customer-birthdays",
            PipelineKind::CustomerRisk => "customer-risk",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
#[error("unknown pipeline {0:?} (expected stations, customer-birthdays or customer-risk)")]
pub struct UnknownPipeline(String);

impl FromStr for PipelineKind {
    type Err = UnknownPipeline;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| UnknownPipeline(s.to_string()))
    }
}

/// Build and run one pipeline against `broker` until stopped or drained
pub async fn run<B: BrokerAdapter>(
    kind: PipelineKind,
    broker: B,
    config: &PipelineConfig,
    drain: bool,
    stop: watch::Receiver<bool>,
) -> Result<DriverStats, DriverError> {
    let checkpoints = CheckpointStore::open(&config.checkpoint_store, kind.name())?;
    let driver_config = DriverConfig::from_pipeline(config).drain(drain);
    let topics = &config.topics;
    tracing::info!(pipeline = %kind, checkpoint = %checkpoints.path().display(), "starting pipeline");

    match kind {
        PipelineKind::Stations => {
            Driver::new(
                broker.clone(),
                StationsStage::new(topics),
                stations::table_sink(broker, topics),
                checkpoints,
                ProvisionedTopics::new(),
                driver_config,
            )
            .run(stop)
            .await
        }
        PipelineKind::CustomerBirthdays => {
            Driver::new(
                broker,
                birthdays::stage(topics),
                ConsoleSink::stdout(),
                checkpoints,
                ProvisionedTopics::new(),
                driver_config,
            )
            .run(stop)
            .await
        }
        PipelineKind::CustomerRisk => {
            Driver::new(
                broker.clone(),
                CustomerRiskStage::new(topics, config.join()),
                TopicSink::new(broker, &topics.risk_output),
                checkpoints,
                ProvisionedTopics::new(),
                driver_config,
            )
            .run(stop)
            .await
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
