// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-pipeline committed input positions
//!
//! A checkpoint maps each consumed `topic/partition` to the next offset the
//! pipeline has not yet finished, plus an opaque stage state captured at
//! the same point. It is rewritten atomically (temp file, fsync, rename)
//! and guarded by an exclusive lock file, so only one instance of a
//! pipeline runs against a checkpoint directory at a time.

use crate::StorageError;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use trib_core::TopicPartition;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointFile {
    pipeline: String,
    #[serde(default)]
    positions: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    state: Option<Value>,
}

/// Durable offsets for one pipeline
#[derive(Debug)]
pub struct CheckpointStore {
    pipeline: String,
    path: PathBuf,
    // Held for the lifetime of the store; dropping releases the lock
    _lock: File,
    positions: BTreeMap<String, u64>,
    state: Option<Value>,
}

impl CheckpointStore {
    /// Open (or create) the checkpoint for `pipeline` under `dir`.
    ///
    /// Fails with [`StorageError::Locked`] if another store holds it.
    pub fn open(dir: &Path, pipeline: &str) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir)?;

        let lock_path = dir.join(format!("{pipeline}.lock"));
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)?;
        if lock.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked(lock_path));
        }

        let path = dir.join(format!("{pipeline}.checkpoint.json"));
        let file = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            CheckpointFile::default()
        };
        let CheckpointFile {
            positions, state, ..
        } = file;

        tracing::debug!(
            pipeline,
            path = %path.display(),
            partitions = positions.len(),
            has_state = state.is_some(),
            "checkpoint opened"
        );

        Ok(Self {
            pipeline: pipeline.to_string(),
            path,
            _lock: lock,
            positions,
            state,
        })
    }

    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Committed next offset for a partition, if any
    pub fn position(&self, tp: &TopicPartition) -> Option<u64> {
        self.positions.get(&tp.to_string()).copied()
    }

    /// All committed positions keyed by `topic/partition`
    pub fn positions(&self) -> &BTreeMap<String, u64> {
        &self.positions
    }

    /// Stage state saved with the last commit
    pub fn state(&self) -> Option<&Value> {
        self.state.as_ref()
    }

    /// Record `next` as the resume point for `tp` and persist it
    pub fn commit(&mut self, tp: &TopicPartition, next: u64) -> Result<(), StorageError> {
        let state = self.state.clone();
        self.commit_all([(tp, next)], state)
    }

    /// Record resume points and stage state together in one write.
    ///
    /// Nothing is written when neither changed.
    pub fn commit_all<'a>(
        &mut self,
        positions: impl IntoIterator<Item = (&'a TopicPartition, u64)>,
        state: Option<Value>,
    ) -> Result<(), StorageError> {
        let mut changed = self.state != state;
        self.state = state;
        for (tp, next) in positions {
            let key = tp.to_string();
            if self.positions.get(&key) != Some(&next) {
                self.positions.insert(key, next);
                changed = true;
            }
        }
        if !changed {
            return Ok(());
        }
        self.persist()
    }

    fn persist(&self) -> Result<(), StorageError> {
        let file = CheckpointFile {
            pipeline: self.pipeline.clone(),
            positions: self.positions.clone(),
            state: self.state.clone(),
        };
        let content = serde_json::to_vec_pretty(&file)?;

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut out = File::create(&tmp)?;
            out.write_all(&content)?;
            out.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;

        // Persist the rename itself; not every platform allows opening a dir
        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
