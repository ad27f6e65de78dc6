// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payload schemas for the transit and customer-risk pipelines

mod customer;
mod risk;
mod station;

pub use customer::{BirthYear, Customer, RedisMessage, ZSetEntry};
pub use risk::{CustomerRiskBirthday, RiskEvent, RiskScore};
pub use station::{Line, Station, TransformedStation};

/// A value that supplies the key of the record it is published as
pub trait Keyed {
    fn record_key(&self) -> Option<Vec<u8>>;
}

/// A value that can be rendered as one row of a text table
pub trait Tabular {
    fn columns() -> &'static [&'static str];
    fn row(&self) -> Vec<String>;
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
