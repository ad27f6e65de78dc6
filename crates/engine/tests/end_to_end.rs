// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

//! Pipelines run against the file-backed broker

use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::watch;
use trib_adapters::{BrokerAdapter, FileBroker, Subscription};
use trib_core::schema::{Customer, Line, RedisMessage};
use trib_core::{Codec, NestedCodec, PipelineConfig, StartPosition};
use trib_engine::pipelines::{self, stations, PipelineKind};
use trib_engine::{DriverStats, Sink};

struct Harness {
    _dir: TempDir,
    broker: FileBroker,
    config: PipelineConfig,
}

impl Harness {
    async fn new(topics: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();
        let broker = FileBroker::new(dir.path().join("broker"));
        for topic in topics {
            broker.ensure_topic(topic, 1, 1).await.unwrap();
        }
        let config = PipelineConfig {
            checkpoint_store: dir.path().join("checkpoints"),
            ..PipelineConfig::default()
        };
        Self {
            _dir: dir,
            broker,
            config,
        }
    }

    async fn publish(&self, topic: &str, value: Vec<u8>) {
        self.broker.publish(topic, None, Some(value)).await.unwrap();
    }

    async fn run(&self, kind: PipelineKind) -> DriverStats {
        let (_tx, rx) = watch::channel(false);
        pipelines::run(kind, self.broker.clone(), &self.config, true, rx)
            .await
            .unwrap()
    }

    async fn read_json(&self, topic: &str) -> Vec<Value> {
        let mut sub = self
            .broker
            .subscribe(topic, 0, StartPosition::Earliest)
            .await
            .unwrap();
        let mut values = Vec::new();
        while let Some(record) = sub.poll().await.unwrap() {
            values.push(serde_json::from_slice(&record.value.unwrap()).unwrap());
        }
        values
    }
}

fn station(id: i64, red: bool, blue: bool, green: bool) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "stop_id": 30000 + id,
        "direction_id": "S",
        "stop_name": "platform",
        "station_name": format!("station {id}"),
        "station_descriptive_name": "descriptive",
        "station_id": id,
        "order": 7,
        "red": red,
        "blue": blue,
        "green": green
    }))
    .unwrap()
}

fn customer(email: &str, birth_day: &str) -> Vec<u8> {
    NestedCodec::<RedisMessage, Customer>::new().encode(&Customer {
        customer_name: Some("Test".to_string()),
        email: Some(email.to_string()),
        phone: Some("555-0100".to_string()),
        birth_day: Some(birth_day.to_string()),
    })
}

fn risk(customer: &str, score: f64) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "customer": customer,
        "score": score,
        "riskDate": "2026-03-01T12:00:00.000Z"
    }))
    .unwrap()
}

#[tokio::test]
async fn station_flags_become_table_rows() {
    let h = Harness::new(&["org.chicago.cta.stations"]).await;
    h.publish("org.chicago.cta.stations", station(1, true, false, false))
        .await;
    h.publish("org.chicago.cta.stations", station(2, true, true, false))
        .await;
    h.publish("org.chicago.cta.stations", station(3, false, false, false))
        .await;

    let stats = h.run(PipelineKind::Stations).await;
    assert_eq!(stats.emitted, 3);

    let mut table = stations::table_sink(h.broker.clone(), &h.config.topics);
    assert_eq!(table.restore().await.unwrap(), 3);
    let line = |id| table.table().get(&id).map(|s| s.line);
    assert_eq!(line(1), Some(Line::Red));
    assert_eq!(line(2), Some(Line::Red));
    assert_eq!(line(3), Some(Line::Green));
}

#[tokio::test]
async fn partitioned_changelog_restores_every_station() {
    let h = Harness::new(&["org.chicago.cta.stations"]).await;
    h.broker
        .ensure_topic(&h.config.topics.stations_changelog, 4, 1)
        .await
        .unwrap();
    for id in 1..=8 {
        h.publish("org.chicago.cta.stations", station(id, false, true, false))
            .await;
    }

    assert_eq!(h.run(PipelineKind::Stations).await.emitted, 8);

    let mut table = stations::table_sink(h.broker.clone(), &h.config.topics);
    assert_eq!(table.restore().await.unwrap(), 8);
    assert_eq!(table.table().len(), 8);
    assert!(table.table().iter().all(|(_, s)| s.line == Line::Blue));
}

#[tokio::test]
async fn birthday_then_score_is_published_joined() {
    let h = Harness::new(&["redis-server", "stedi-events"]).await;
    h.publish("redis-server", customer("x@test.com", "1960-01-01"))
        .await;
    h.publish("stedi-events", risk("x@test.com", -0.5)).await;

    let stats = h.run(PipelineKind::CustomerRisk).await;

    assert_eq!(stats.emitted, 1);
    assert_eq!(
        h.read_json("risk-scores-and-birthdays").await,
        vec![json!({
            "customer": "x@test.com",
            "score": -0.5,
            "email": "x@test.com",
            "birthYear": "1960"
        })]
    );
}

#[tokio::test]
async fn malformed_bytes_are_skipped_and_passed() {
    let h = Harness::new(&["stedi-events", "redis-server"]).await;
    h.publish("stedi-events", b"\xff\xfe definitely not json".to_vec())
        .await;
    h.publish("stedi-events", risk("x@test.com", 3.0)).await;
    h.publish("redis-server", customer("x@test.com", "1984-07-04"))
        .await;

    let stats = h.run(PipelineKind::CustomerRisk).await;
    assert_eq!(stats.processed, 3);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.emitted, 1);

    // Nothing left to read on restart
    let again = h.run(PipelineKind::CustomerRisk).await;
    assert_eq!(again.processed, 0);
}

#[tokio::test]
async fn pending_join_side_survives_restart() {
    let h = Harness::new(&["redis-server", "stedi-events"]).await;
    h.publish("redis-server", customer("late@test.com", "1971-09-09"))
        .await;
    assert_eq!(h.run(PipelineKind::CustomerRisk).await.emitted, 0);

    h.publish("stedi-events", risk("late@test.com", 8.5)).await;
    let stats = h.run(PipelineKind::CustomerRisk).await;

    assert_eq!(stats.emitted, 1);
    let published = h.read_json("risk-scores-and-birthdays").await;
    assert_eq!(published.len(), 1);
    assert_eq!(published[0]["birthYear"], "1971");
}

#[tokio::test]
async fn restart_produces_same_output_as_uninterrupted_run() {
    let redis = [customer("a@test.com", "1960-01-01"), customer("b@test.com", "1970-02-02")];
    let stedi = [risk("b@test.com", 1.0), risk("b@test.com", 9.0)];

    let whole = Harness::new(&["redis-server", "stedi-events"]).await;
    for value in redis.iter().cloned() {
        whole.publish("redis-server", value).await;
    }
    for value in stedi.iter().cloned() {
        whole.publish("stedi-events", value).await;
    }
    whole.run(PipelineKind::CustomerRisk).await;

    let restarted = Harness::new(&["redis-server", "stedi-events"]).await;
    for value in redis.iter().cloned() {
        restarted.publish("redis-server", value).await;
    }
    restarted.publish("stedi-events", stedi[0].clone()).await;
    restarted.run(PipelineKind::CustomerRisk).await;
    restarted.publish("stedi-events", stedi[1].clone()).await;
    let resumed = restarted.run(PipelineKind::CustomerRisk).await;
    assert_eq!(resumed.processed, 1);

    let expected = vec![json!({
        "customer": "b@test.com",
        "score": 1.0,
        "email": "b@test.com",
        "birthYear": "1970"
    })];
    assert_eq!(whole.read_json("risk-scores-and-birthdays").await, expected);
    assert_eq!(restarted.read_json("risk-scores-and-birthdays").await, expected);
}

#[tokio::test]
async fn birthdays_pipeline_consumes_customers() {
    let h = Harness::new(&["redis-server"]).await;
    h.publish("redis-server", customer("a@test.com", "1990-10-10"))
        .await;
    h.publish("redis-server", b"{}".to_vec()).await;

    let stats = h.run(PipelineKind::CustomerBirthdays).await;
    assert_eq!(stats.processed, 2);
    assert_eq!(stats.emitted, 1);
    assert_eq!(stats.skipped, 1);
}
