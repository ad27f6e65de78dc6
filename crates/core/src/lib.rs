// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! trib-core: record model and pure processing stages for Tributary
//!
//! This crate provides:
//! - Log records and their decoded form
//! - The codec layer (direct JSON and base64-within-JSON payloads)
//! - Payload schemas for the transit and customer-risk pipelines
//! - Pure transforms and the stream-stream join stage
//! - Pipeline configuration

pub mod clock;
pub mod codec;
pub mod config;
pub mod join;
pub mod record;
pub mod schema;
pub mod transform;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock};
pub use codec::{Codec, DecodeError, Envelope, JsonCodec, NestedCodec};
pub use config::{BrokerAddress, ConfigError, OffsetPolicy, PipelineConfig, TopicNames};
pub use join::{
    Arrival, JoinConfig, JoinKey, JoinOutcome, JoinSnapshot, JoinStage, JoinStats, Joined, Side,
};
pub use record::{DecodedRecord, Record, RecordMeta, StartPosition, TopicPartition};
pub use schema::{Keyed, Tabular};
pub use transform::Transform;
