// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log entry structure with checksum verification
//!
//! Each line of a segment file is one JSON entry carrying the offset,
//! timestamp, base64 key and value, and a CRC32 over all of them.

use crate::StorageError;
use serde::{Deserialize, Serialize};

/// A single record in a segment file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position within the partition, assigned on append
    pub offset: u64,
    /// Milliseconds since Unix epoch, assigned on append
    pub timestamp: i64,
    #[serde(with = "opt_base64", default)]
    pub key: Option<Vec<u8>>,
    /// `None` is a tombstone
    #[serde(with = "opt_base64", default)]
    pub value: Option<Vec<u8>>,
    /// CRC32 of offset, timestamp, key and value
    pub checksum: u32,
}

impl LogEntry {
    /// Create a new entry with computed checksum
    pub fn new(offset: u64, timestamp: i64, key: Option<Vec<u8>>, value: Option<Vec<u8>>) -> Self {
        let checksum = Self::calculate_checksum(offset, timestamp, key.as_deref(), value.as_deref());
        Self {
            offset,
            timestamp,
            key,
            value,
            checksum,
        }
    }

    fn calculate_checksum(
        offset: u64,
        timestamp: i64,
        key: Option<&[u8]>,
        value: Option<&[u8]>,
    ) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&offset.to_le_bytes());
        hasher.update(&timestamp.to_le_bytes());
        // Length prefixes keep (None, x) and (Some(""), x) distinct
        for part in [key, value] {
            match part {
                Some(bytes) => {
                    hasher.update(&[1]);
                    hasher.update(&(bytes.len() as u64).to_le_bytes());
                    hasher.update(bytes);
                }
                None => hasher.update(&[0]),
            }
        }
        hasher.finalize()
    }

    /// Verify the checksum matches the contents
    pub fn verify(&self) -> bool {
        self.checksum
            == Self::calculate_checksum(
                self.offset,
                self.timestamp,
                self.key.as_deref(),
                self.value.as_deref(),
            )
    }

    /// Serialize to newline-delimited JSON (one line, no newline)
    pub fn to_line(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(StorageError::from)
    }

    /// Parse from a single line of JSON
    pub fn from_line(line: &str) -> Result<Self, StorageError> {
        serde_json::from_str(line).map_err(StorageError::from)
    }
}

mod opt_base64 {
    use base64::{engine::general_purpose, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, s: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => s.serialize_some(&general_purpose::STANDARD.encode(b)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<u8>>, D::Error> {
        let text: Option<String> = Option::deserialize(d)?;
        text.map(|t| {
            general_purpose::STANDARD
                .decode(t)
                .map_err(serde::de::Error::custom)
        })
        .transpose()
    }
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
