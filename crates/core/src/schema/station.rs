// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transit station events

use super::{Keyed, Tabular};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Station row as ingested from the stations topic.
///
/// Every field is required; a payload lacking one fails to decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub stop_id: i64,
    pub direction_id: String,
    pub stop_name: String,
    pub station_name: String,
    pub station_descriptive_name: String,
    pub station_id: i64,
    pub order: i64,
    pub red: bool,
    pub blue: bool,
    pub green: bool,
}

/// Train line serving a station
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Line {
    Red,
    Blue,
    Green,
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Red => f.write_str("red"),
            Line::Blue => f.write_str("blue"),
            Line::Green => f.write_str("green"),
        }
    }
}

/// Station reduced to the fields the table serves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformedStation {
    pub station_id: i64,
    pub station_name: String,
    pub order: i64,
    pub line: Line,
}

impl Keyed for TransformedStation {
    fn record_key(&self) -> Option<Vec<u8>> {
        Some(self.station_id.to_string().into_bytes())
    }
}

impl Tabular for TransformedStation {
    fn columns() -> &'static [&'static str] {
        &["station_id", "station_name", "order", "line"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.station_id.to_string(),
            self.station_name.clone(),
            self.order.to_string(),
            self.line.to_string(),
        ]
    }
}
