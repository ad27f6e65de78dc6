// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Customer records mirrored from Redis sorted-set changes

use super::{Keyed, Tabular};
use crate::codec::Envelope;
use serde::{Deserialize, Serialize};

/// Change event emitted by the Redis source connector.
///
/// The connector also sends a lowercase `zsetEntries` duplicate; only
/// `zSetEntries` is read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedisMessage {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub expired_type: Option<String>,
    #[serde(default)]
    pub expired_value: Option<String>,
    #[serde(default)]
    pub exist_type: Option<String>,
    #[serde(default, alias = "Ch")]
    pub ch: Option<bool>,
    #[serde(default, alias = "Incr")]
    pub incr: Option<bool>,
    #[serde(default)]
    pub z_set_entries: Vec<ZSetEntry>,
}

/// One member of a sorted set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZSetEntry {
    pub element: String,
    #[serde(default, alias = "Score")]
    pub score: Option<serde_json::Value>,
}

impl Envelope for RedisMessage {
    const PAYLOAD_FIELD: &'static str = "zSetEntries[0].element";

    fn payload(&self) -> Option<&str> {
        self.z_set_entries.first().map(|e| e.element.as_str())
    }

    fn wrap(encoded: String) -> Self {
        RedisMessage {
            exist_type: Some("NONE".to_string()),
            ch: Some(false),
            incr: Some(false),
            z_set_entries: vec![ZSetEntry {
                element: encoded,
                score: Some(serde_json::json!(0.0)),
            }],
            ..Default::default()
        }
    }
}

/// Customer profile stored in Redis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub birth_day: Option<String>,
}

/// Customer email paired with the year part of the birthday
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthYear {
    pub email: String,
    pub birth_year: String,
}

impl Keyed for BirthYear {
    fn record_key(&self) -> Option<Vec<u8>> {
        Some(self.email.clone().into_bytes())
    }
}

impl Tabular for BirthYear {
    fn columns() -> &'static [&'static str] {
        &["email", "birthYear"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.email.clone(), self.birth_year.clone()]
    }
}
