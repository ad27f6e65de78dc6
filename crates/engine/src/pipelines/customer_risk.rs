// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Risk scores joined with customer birth years
//!
//! Input 0 is the Redis customer stream (join key: email), input 1 the
//! risk events (join key: customer). The driver reads them round-robin in
//! that order. Unmatched entries travel with the checkpoint as a join
//! snapshot.

use crate::error::StageError;
use crate::stage::{Change, Stage};
use serde_json::Value;
use trib_core::schema::{BirthYear, Customer, CustomerRiskBirthday, RedisMessage, RiskEvent, RiskScore};
use trib_core::transform::{CustomerBirthYear, RiskProjection};
use trib_core::{
    Arrival, Codec, DecodedRecord, JoinConfig, JoinKey, JoinOutcome, JoinSnapshot, JoinStage,
    JoinStats, JsonCodec, NestedCodec, Record, TopicNames, Transform,
};

const BIRTHDAYS: usize = 0;
const RISK: usize = 1;

pub struct CustomerRiskStage {
    inputs: Vec<String>,
    customers: NestedCodec<RedisMessage, Customer>,
    risk_events: JsonCodec<RiskEvent>,
    join: JoinStage<BirthYear, RiskScore>,
}

impl CustomerRiskStage {
    pub fn new(topics: &TopicNames, join: JoinConfig) -> Self {
        Self {
            inputs: vec![topics.redis_server.clone(), topics.stedi_events.clone()],
            customers: NestedCodec::new(),
            risk_events: JsonCodec::new(),
            join: JoinStage::new(join),
        }
    }

    pub fn join_stats(&self) -> JoinStats {
        self.join.stats()
    }

    pub fn pending(&self) -> usize {
        self.join.pending_len()
    }

    fn observe(
        &mut self,
        record: &Record,
        arrival: Arrival<BirthYear, RiskScore>,
        key: JoinKey,
    ) -> Vec<Change<CustomerRiskBirthday>> {
        match self.join.observe(arrival, key) {
            JoinOutcome::Emit(joined) => {
                tracing::debug!(key = %joined.key, offset = record.offset, "join matched");
                let combined =
                    CustomerRiskBirthday::from_parts(joined.left.value, joined.right.value);
                vec![Change::Upsert(DecodedRecord::new(record.meta(), combined))]
            }
            JoinOutcome::Buffered => Vec::new(),
        }
    }
}

impl Stage for CustomerRiskStage {
    type Output = CustomerRiskBirthday;

    fn name(&self) -> &str {
        super::PipelineKind::CustomerRisk.name()
    }

    fn inputs(&self) -> &[String] {
        &self.inputs
    }

    fn process(
        &mut self,
        input: usize,
        record: &Record,
    ) -> Result<Vec<Change<CustomerRiskBirthday>>, StageError> {
        match input {
            BIRTHDAYS => {
                let decoded = self.customers.decode_record(record)?;
                let Some(birth) = CustomerBirthYear.transform(decoded) else {
                    tracing::debug!(offset = record.offset, "customer without email or birthday");
                    return Ok(Vec::new());
                };
                let key = birth.value.email.clone();
                Ok(self.observe(record, Arrival::Left(birth), key))
            }
            RISK => {
                let decoded = self.risk_events.decode_record(record)?;
                let Some(risk) = RiskProjection.transform(decoded) else {
                    return Ok(Vec::new());
                };
                let key = risk.value.customer.clone();
                Ok(self.observe(record, Arrival::Right(risk), key))
            }
            other => Err(StageError::UnknownInput(other)),
        }
    }

    fn snapshot(&self) -> Result<Option<Value>, StageError> {
        Ok(Some(serde_json::to_value(self.join.snapshot())?))
    }

    fn restore(&mut self, state: Value) -> Result<(), StageError> {
        let snapshot: JoinSnapshot<BirthYear, RiskScore> = serde_json::from_value(state)?;
        tracing::debug!(
            left = snapshot.left.len(),
            right = snapshot.right.len(),
            "join state restored"
        );
        self.join.restore(snapshot);
        Ok(())
    }
}

#[cfg(test)]
#[path = "customer_risk_tests.rs"]
mod tests;
