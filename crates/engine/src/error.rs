// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the pipeline engine

use thiserror::Error;
use trib_adapters::BrokerError;
use trib_core::DecodeError;
use trib_storage::StorageError;

/// Errors from processing one input record
#[derive(Debug, Error)]
pub enum StageError {
    /// The record cannot be decoded; it is skipped
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("no input at index {0}")]
    UnknownInput(usize),
    #[error("invalid stage state: {0}")]
    State(#[from] serde_json::Error),
}

/// Errors from writing one change to a sink
#[derive(Debug, Error)]
pub enum SinkError {
    #[error(transparent)]
    Broker(#[from] BrokerError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{sink} requires a record key")]
    MissingKey { sink: String },
    #[error("invalid key {key:?} for {sink}")]
    InvalidKey { sink: String, key: String },
}

impl SinkError {
    /// Whether retrying the same write may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SinkError::Broker(BrokerError::Unavailable(_)) => true,
            SinkError::Broker(BrokerError::Storage(StorageError::Io(_))) => true,
            SinkError::Io(_) => true,
            _ => false,
        }
    }
}

/// Errors that stop a pipeline driver
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("failed to provision topic {topic}: {source}")]
    TopicProvision {
        topic: String,
        #[source]
        source: BrokerError,
    },
    #[error("sink unavailable after {attempts} attempts: {source}")]
    SinkUnavailable {
        attempts: u32,
        #[source]
        source: SinkError,
    },
    #[error("sink rejected write: {0}")]
    SinkRejected(#[source] SinkError),
    #[error("failed to restore sink state: {0}")]
    Restore(#[source] SinkError),
    #[error("broker error: {0}")]
    Broker(#[from] BrokerError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] StorageError),
    #[error("stage error: {0}")]
    Stage(#[source] StageError),
}
