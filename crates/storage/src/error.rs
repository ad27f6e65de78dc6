// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage error type

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupted entry in {path} at byte {position}: {reason}")]
    Corrupted {
        path: PathBuf,
        position: u64,
        reason: String,
    },
    #[error("{0} is locked by another process")]
    Locked(PathBuf),
}
