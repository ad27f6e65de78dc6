// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Base64-within-JSON codec

use super::{Codec, DecodeError, JsonCodec};
use base64::{engine::general_purpose, Engine as _};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;

/// An outer structure carrying a base64-encoded inner payload
pub trait Envelope: Serialize + DeserializeOwned {
    /// Field path of the embedded payload, used in error reports
    const PAYLOAD_FIELD: &'static str;

    /// The base64 text of the embedded payload, if the envelope carries one
    fn payload(&self) -> Option<&str>;

    /// Build an envelope around an already base64-encoded payload
    fn wrap(encoded: String) -> Self;
}

/// Decodes the envelope `E`, base64-decodes its payload, then decodes `T`
pub struct NestedCodec<E, T> {
    outer: JsonCodec<E>,
    inner: JsonCodec<T>,
    _marker: PhantomData<fn() -> (E, T)>,
}

impl<E, T> NestedCodec<E, T> {
    pub fn new() -> Self {
        Self {
            outer: JsonCodec::new(),
            inner: JsonCodec::new(),
            _marker: PhantomData,
        }
    }
}

impl<E, T> Default for NestedCodec<E, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E, T> Codec<T> for NestedCodec<E, T>
where
    E: Envelope,
    T: Serialize + DeserializeOwned,
{
    fn decode(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        let envelope = self.outer.decode(bytes)?;
        let encoded = envelope
            .payload()
            .ok_or_else(|| DecodeError::MissingField(E::PAYLOAD_FIELD.to_string()))?;

        let raw = general_purpose::STANDARD
            .decode(encoded.trim())
            .map_err(|e| DecodeError::Base64 {
                field: E::PAYLOAD_FIELD.to_string(),
                reason: e.to_string(),
            })?;

        self.inner.decode(&raw)
    }

    fn encode(&self, value: &T) -> Vec<u8> {
        let raw = self.inner.encode(value);
        let envelope = E::wrap(general_purpose::STANDARD.encode(raw));
        self.outer.encode(&envelope)
    }
}
