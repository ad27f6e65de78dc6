// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Codec layer: raw record bytes to typed values and back
//!
//! Two payload shapes are supported:
//!
//! ```text
//! direct:  bytes ──json──▶ T
//! nested:  bytes ──json──▶ Envelope ──field──▶ base64 ──▶ bytes ──json──▶ T
//! ```
//!
//! Unknown fields are ignored on decode. A missing required field is
//! reported as [`DecodeError::MissingField`] so the driver can skip the
//! record without halting the stream.

mod json;
mod nested;

pub use json::JsonCodec;
pub use nested::{Envelope, NestedCodec};

use crate::record::{DecodedRecord, Record};
use thiserror::Error;

/// Errors produced while decoding a record payload
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("missing field: {0}")]
    MissingField(String),
    #[error("malformed payload: {0}")]
    Malformed(String),
    #[error("invalid base64 in {field}: {reason}")]
    Base64 { field: String, reason: String },
    #[error("record has no value")]
    Empty,
}

impl DecodeError {
    /// Classify a serde_json error, pulling out the field name when the
    /// payload is missing a required field.
    pub fn from_json(err: &serde_json::Error) -> Self {
        let message = err.to_string();
        match missing_field_name(&message) {
            Some(field) => DecodeError::MissingField(field.to_string()),
            None => DecodeError::Malformed(message),
        }
    }
}

// serde reports missing fields as "missing field `name` at line 1 column 42"
fn missing_field_name(message: &str) -> Option<&str> {
    let rest = message.strip_prefix("missing field `")?;
    let end = rest.find('`')?;
    Some(&rest[..end])
}

/// Decode/encode pair for one payload type
pub trait Codec<T> {
    /// Parse a payload. Never yields a partially populated value.
    fn decode(&self, bytes: &[u8]) -> Result<T, DecodeError>;

    /// Serialize a value. A value the format cannot express is logged and
    /// encoded as an empty payload.
    fn encode(&self, value: &T) -> Vec<u8>;

    /// Decode the value of a log record, keeping its identity
    fn decode_record(&self, record: &Record) -> Result<DecodedRecord<T>, DecodeError> {
        let bytes = record.value.as_deref().ok_or(DecodeError::Empty)?;
        let value = self.decode(bytes)?;
        Ok(DecodedRecord::new(record.meta(), value))
    }
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
