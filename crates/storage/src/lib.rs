// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! trib-storage: durable files behind the broker and the driver
//!
//! - Segment files: checksummed, fsync'd, append-only partition logs
//! - Checkpoints: per-pipeline committed offsets, written atomically
//! - Materialized tables rebuilt from changelogs

mod checkpoint;
mod entry;
mod error;
pub mod segment;
mod table;

pub use checkpoint::CheckpointStore;
pub use entry::LogEntry;
pub use error::StorageError;
pub use segment::{SegmentCursor, SegmentWriter};
pub use table::{MaterializedTable, TableUpdate};
