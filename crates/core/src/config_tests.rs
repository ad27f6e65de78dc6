// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[test]
fn empty_file_yields_defaults() {
    let config = PipelineConfig::parse("").unwrap();
    assert_eq!(config, PipelineConfig::default());
    assert_eq!(config.topics.stations, "org.chicago.cta.stations");
    assert_eq!(config.join_retention_window, None);
}

#[test]
fn parses_every_recognized_option() {
    let config = PipelineConfig::parse(
        r#"
        broker_address = "file:///var/lib/trib"
        starting_offset_policy = "latest"
        checkpoint_store = "/var/lib/trib/checkpoints"
        join_retention_window = "15m"
        join_max_pending = 10000
        sink_retry_limit = 3
        sink_retry_backoff = "50ms"
        sink_retry_backoff_max = "2s"
        idle_poll_interval = "1s"
        partition = 2

        [topics]
        risk_output = "risk-v2"
        "#,
    )
    .unwrap();

    assert_eq!(
        config.broker().unwrap(),
        BrokerAddress::File(PathBuf::from("/var/lib/trib"))
    );
    assert_eq!(config.starting_offset_policy, OffsetPolicy::Latest);
    assert_eq!(config.join_retention_window, Some(Duration::from_secs(900)));
    assert_eq!(config.join_max_pending, Some(10_000));
    assert_eq!(config.sink_retry_limit, 3);
    assert_eq!(config.sink_retry_backoff, Duration::from_millis(50));
    assert_eq!(config.sink_retry_backoff_max, Duration::from_secs(2));
    assert_eq!(config.idle_poll_interval, Duration::from_secs(1));
    assert_eq!(config.partition, 2);
    assert_eq!(config.topics.risk_output, "risk-v2");
    assert_eq!(config.topics.redis_server, "redis-server");
}

#[parameterized(
    lowercase = { "none" },
    uppercase = { "NONE" },
)]
fn retention_none_disables_expiry(value: &str) {
    let config = PipelineConfig::parse(&format!("join_retention_window = \"{value}\"")).unwrap();
    assert_eq!(config.join().retention, None);
}

#[test]
fn retention_rejects_garbage() {
    let err = PipelineConfig::parse("join_retention_window = \"soon\"").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn zero_retry_limit_is_invalid() {
    let err = PipelineConfig::parse("sink_retry_limit = 0").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[parameterized(
    kafka = { "kafka://localhost:9092" },
    plaintext = { "PLAINTEXT://localhost:9092" },
    empty_file = { "file://" },
)]
fn non_file_brokers_are_rejected(address: &str) {
    let err = PipelineConfig::parse(&format!("broker_address = \"{address}\"")).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedBroker(_)));
}

#[test]
fn bare_path_is_file_broker() {
    let config = PipelineConfig::parse("broker_address = \"data/broker\"").unwrap();
    assert_eq!(
        config.broker().unwrap(),
        BrokerAddress::File(PathBuf::from("data/broker"))
    );
}

#[test]
fn rebase_anchors_relative_paths() {
    let config = PipelineConfig::default().rebase(Path::new("/srv/trib"));
    assert_eq!(config.checkpoint_store, PathBuf::from("/srv/trib/./checkpoints"));
    assert_eq!(
        config.broker().unwrap(),
        BrokerAddress::File(PathBuf::from("/srv/trib/./broker"))
    );
}

#[test]
fn load_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = PipelineConfig::load(&dir.path().join("trib.toml")).unwrap();
    assert_eq!(config, PipelineConfig::default());
}

#[test]
fn offset_policy_maps_to_start_position() {
    assert_eq!(OffsetPolicy::Earliest.start_position(), StartPosition::Earliest);
    assert_eq!(OffsetPolicy::Latest.start_position(), StartPosition::Latest);
}
