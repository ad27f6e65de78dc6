// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transit stations materialized into a table keyed by station id

use crate::error::StageError;
use crate::sink::TableSink;
use crate::stage::{Change, Stage, TransformStage};
use trib_core::schema::{Station, TransformedStation};
use trib_core::transform::StationLine;
use trib_core::{DecodeError, JsonCodec, Record, TopicNames};

pub type StationsTable<B> = TableSink<B, i64, TransformedStation>;

/// Station events to table rows. A tombstone keyed by a station id
/// deletes that station's row.
pub struct StationsStage {
    inner: TransformStage<Station, JsonCodec<Station>, StationLine>,
}

impl StationsStage {
    pub fn new(topics: &TopicNames) -> Self {
        Self {
            inner: TransformStage::new(
                super::PipelineKind::Stations.name(),
                &topics.stations,
                JsonCodec::new(),
                StationLine,
            ),
        }
    }
}

impl Stage for StationsStage {
    type Output = TransformedStation;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn inputs(&self) -> &[String] {
        self.inner.inputs()
    }

    fn process(
        &mut self,
        input: usize,
        record: &Record,
    ) -> Result<Vec<Change<TransformedStation>>, StageError> {
        if input == 0 && record.is_tombstone() {
            let station_id = record
                .key_str()
                .and_then(|k| k.trim().parse::<i64>().ok())
                .ok_or_else(|| {
                    DecodeError::Malformed("tombstone key is not a station id".to_string())
                })?;
            return Ok(vec![Change::Delete {
                key: station_id.to_string().into_bytes(),
            }]);
        }
        self.inner.process(input, record)
    }
}

/// The `transformed_stations` table and its changelog
pub fn table_sink<B>(broker: B, topics: &TopicNames) -> StationsTable<B> {
    TableSink::new(broker, &topics.stations_table, &topics.stations_changelog)
}

#[cfg(test)]
#[path = "stations_tests.rs"]
mod tests;
