// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Processing stages between input records and sink changes

use crate::error::StageError;
use serde_json::Value;
use std::marker::PhantomData;
use trib_core::{Codec, DecodedRecord, Record, Transform};

/// One change a stage hands to its sink
#[derive(Debug, Clone, PartialEq)]
pub enum Change<O> {
    Upsert(DecodedRecord<O>),
    /// Remove the entry for a record key
    Delete { key: Vec<u8> },
}

/// Decodes input records and produces sink changes.
///
/// A stage is owned by one driver and called for one record at a time, in
/// the driver's fan-in order.
pub trait Stage: Send {
    type Output: Send + Sync;

    /// Pipeline name, used for logs and the checkpoint file
    fn name(&self) -> &str;

    /// Input topics, in fan-in order
    fn inputs(&self) -> &[String];

    /// Process one record from `inputs()[input]`
    fn process(
        &mut self,
        input: usize,
        record: &Record,
    ) -> Result<Vec<Change<Self::Output>>, StageError>;

    /// In-memory state to persist with the checkpoint; `None` if stateless
    fn snapshot(&self) -> Result<Option<Value>, StageError> {
        Ok(None)
    }

    /// Resume from state saved by [`Stage::snapshot`]
    fn restore(&mut self, _state: Value) -> Result<(), StageError> {
        Ok(())
    }
}

/// Single-input stage: decode, then apply a pure transform
pub struct TransformStage<In, C, T> {
    name: String,
    inputs: Vec<String>,
    codec: C,
    transform: T,
    _input: PhantomData<fn() -> In>,
}

impl<In, C, T> TransformStage<In, C, T> {
    pub fn new(name: impl Into<String>, input: impl Into<String>, codec: C, transform: T) -> Self {
        Self {
            name: name.into(),
            inputs: vec![input.into()],
            codec,
            transform,
            _input: PhantomData,
        }
    }
}

impl<In, C, T> Stage for TransformStage<In, C, T>
where
    C: Codec<In> + Send,
    T: Transform<In> + Send,
    T::Out: Send + Sync,
{
    type Output = T::Out;

    fn name(&self) -> &str {
        &self.name
    }

    fn inputs(&self) -> &[String] {
        &self.inputs
    }

    fn process(&mut self, input: usize, record: &Record) -> Result<Vec<Change<T::Out>>, StageError> {
        if input != 0 {
            return Err(StageError::UnknownInput(input));
        }
        let decoded = self.codec.decode_record(record)?;
        match self.transform.transform(decoded) {
            Some(out) => Ok(vec![Change::Upsert(out)]),
            None => {
                tracing::debug!(
                    topic = %record.topic,
                    offset = record.offset,
                    "record dropped by transform"
                );
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod tests;
