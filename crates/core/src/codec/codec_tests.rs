// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::schema::{Customer, RedisMessage, RiskEvent, Station};
use std::collections::HashMap;
use yare::parameterized;

const SAM_TEST_MESSAGE: &str = r#"{
  "key":"Q3VzdG9tZXI=",
  "existType":"NONE",
  "Ch":false,
  "Incr":false,
  "zSetEntries":[{
    "element":"eyJjdXN0b21lck5hbWUiOiJTYW0gVGVzdCIsImVtYWlsIjoic2FtLnRlc3RAdGVzdC5jb20iLCJwaG9uZSI6IjgwMTU1NTEyMTIiLCJiaXJ0aERheSI6IjIwMDEtMDEtMDMifQ==",
    "Score":0.0
  }],
  "zsetEntries":[{
    "element":"eyJjdXN0b21lck5hbWUiOiJTYW0gVGVzdCIsImVtYWlsIjoic2FtLnRlc3RAdGVzdC5jb20iLCJwaG9uZSI6IjgwMTU1NTEyMTIiLCJiaXJ0aERheSI6IjIwMDEtMDEtMDMifQ==",
    "score":0.0
  }]
}"#;

fn station_json() -> serde_json::Value {
    serde_json::json!({
        "stop_id": 30001,
        "direction_id": "E",
        "stop_name": "Austin (O'Hare-bound)",
        "station_name": "Austin",
        "station_descriptive_name": "Austin (Blue Line)",
        "station_id": 40010,
        "order": 29,
        "red": false,
        "blue": true,
        "green": false
    })
}

#[test]
fn json_decodes_station() {
    let codec = JsonCodec::<Station>::new();
    let bytes = serde_json::to_vec(&station_json()).unwrap();
    let station = codec.decode(&bytes).unwrap();
    assert_eq!(station.station_id, 40010);
    assert!(station.blue);
}

#[test]
fn json_ignores_unknown_fields() {
    let codec = JsonCodec::<Station>::new();
    let mut value = station_json();
    value["platform_count"] = serde_json::json!(2);
    let bytes = serde_json::to_vec(&value).unwrap();
    assert!(codec.decode(&bytes).is_ok());
}

#[parameterized(
    stop_id = { "stop_id" },
    station_id = { "station_id" },
    red = { "red" },
    order = { "order" },
)]
fn json_reports_missing_field(field: &str) {
    let codec = JsonCodec::<Station>::new();
    let mut value = station_json();
    value.as_object_mut().unwrap().remove(field);
    let bytes = serde_json::to_vec(&value).unwrap();

    let err = codec.decode(&bytes).unwrap_err();
    assert_eq!(err, DecodeError::MissingField(field.to_string()));
}

#[parameterized(
    not_json = { b"\x00\x01garbage" },
    truncated = { b"{\"customer\":\"a@test.com\"," },
    wrong_type = { b"{\"customer\":\"a@test.com\",\"score\":\"high\"}" },
)]
fn json_reports_malformed(bytes: &[u8]) {
    let codec = JsonCodec::<RiskEvent>::new();
    let err = codec.decode(bytes).unwrap_err();
    assert!(matches!(err, DecodeError::Malformed(_)), "got {err:?}");
}

#[test]
fn json_encode_round_trips_value() {
    let codec = JsonCodec::<RiskEvent>::new();
    let event = RiskEvent {
        customer: "x@test.com".to_string(),
        score: -0.5,
        risk_date: Some("2020-09-14T07:54:06.417Z".to_string()),
    };
    let decoded = codec.decode(&codec.encode(&event)).unwrap();
    assert_eq!(decoded, event);
}

#[test]
fn json_encode_of_unrepresentable_value_is_empty() {
    let codec = JsonCodec::<HashMap<(u8, u8), u8>>::new();
    let value = HashMap::from([((1, 2), 3)]);
    assert!(codec.encode(&value).is_empty());
}

#[test]
fn nested_decodes_customer_from_redis_message() {
    let codec = NestedCodec::<RedisMessage, Customer>::new();
    let customer = codec.decode(SAM_TEST_MESSAGE.as_bytes()).unwrap();
    assert_eq!(customer.customer_name.as_deref(), Some("Sam Test"));
    assert_eq!(customer.email.as_deref(), Some("sam.test@test.com"));
    assert_eq!(customer.birth_day.as_deref(), Some("2001-01-03"));
}

#[test]
fn nested_without_entries_is_missing_field() {
    let codec = NestedCodec::<RedisMessage, Customer>::new();
    let err = codec
        .decode(br#"{"key":"Q3VzdG9tZXI=","zSetEntries":[]}"#)
        .unwrap_err();
    assert_eq!(
        err,
        DecodeError::MissingField("zSetEntries[0].element".to_string())
    );
}

#[test]
fn nested_rejects_invalid_base64() {
    let codec = NestedCodec::<RedisMessage, Customer>::new();
    let err = codec
        .decode(br#"{"zSetEntries":[{"element":"%%not-base64%%"}]}"#)
        .unwrap_err();
    assert!(matches!(err, DecodeError::Base64 { .. }));
}

#[test]
fn nested_rejects_non_json_inner_payload() {
    let codec = NestedCodec::<RedisMessage, Customer>::new();
    // "dGVzdDI=" is base64 for "test2"
    let err = codec
        .decode(br#"{"zSetEntries":[{"element":"dGVzdDI=","score":"0.0"}]}"#)
        .unwrap_err();
    assert!(matches!(err, DecodeError::Malformed(_)));
}

#[test]
fn nested_encode_wraps_inner_payload() {
    let codec = NestedCodec::<RedisMessage, Customer>::new();
    let customer = Customer {
        customer_name: Some("Lyn Davis".to_string()),
        email: Some("Lyn.Davis@test.com".to_string()),
        phone: None,
        birth_day: Some("1955-06-01".to_string()),
    };
    let bytes = codec.encode(&customer);

    let envelope = JsonCodec::<RedisMessage>::new().decode(&bytes).unwrap();
    assert_eq!(envelope.z_set_entries.len(), 1);
    assert_eq!(codec.decode(&bytes).unwrap(), customer);
}

#[test]
fn decode_record_rejects_tombstone() {
    let codec = JsonCodec::<RiskEvent>::new();
    let record = Record {
        topic: "stedi-events".to_string(),
        partition: 0,
        offset: 3,
        timestamp: 0,
        key: None,
        value: None,
    };
    assert_eq!(codec.decode_record(&record).unwrap_err(), DecodeError::Empty);
}

#[test]
fn decode_record_keeps_offset() {
    let codec = JsonCodec::<RiskEvent>::new();
    let record = Record {
        topic: "stedi-events".to_string(),
        partition: 0,
        offset: 12,
        timestamp: 55,
        key: None,
        value: Some(br#"{"customer":"x@test.com","score":-0.5}"#.to_vec()),
    };
    let decoded = codec.decode_record(&record).unwrap();
    assert_eq!(decoded.meta.offset, 12);
    assert_eq!(decoded.value.score, -0.5);
}
