// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Tributary pipeline engine
//!
//! Drives a [`Stage`] over its input topics, writes its changes to a
//! [`Sink`] and checkpoints input positions once writes are durable.

mod driver;
mod error;
pub mod pipelines;
mod provision;
mod retry;
mod sink;
mod stage;

pub use driver::{Driver, DriverConfig, DriverStats};
pub use error::{DriverError, SinkError, StageError};
pub use pipelines::PipelineKind;
pub use provision::{ProvisionedTopics, TopicRequest};
pub use retry::RetryPolicy;
pub use sink::{ConsoleSink, Sink, TableSink, TopicSink};
pub use stage::{Change, Stage, TransformStage};
