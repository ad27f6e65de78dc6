// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Risk score events and the joined output

use super::{BirthYear, Keyed, Tabular};
use serde::{Deserialize, Serialize};

/// Risk score computed by the STEDI application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskEvent {
    pub customer: String,
    pub score: f64,
    #[serde(default)]
    pub risk_date: Option<String>,
}

/// The part of a risk event that participates in the join
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScore {
    pub customer: String,
    pub score: f64,
}

/// Risk score joined with the customer's birth year.
///
/// `customer` and `email` are carried separately even though they are
/// equal: each side keeps its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRiskBirthday {
    pub customer: String,
    pub score: f64,
    pub email: String,
    pub birth_year: String,
}

impl CustomerRiskBirthday {
    pub fn from_parts(birth: BirthYear, risk: RiskScore) -> Self {
        Self {
            customer: risk.customer,
            score: risk.score,
            email: birth.email,
            birth_year: birth.birth_year,
        }
    }
}

impl Keyed for CustomerRiskBirthday {
    fn record_key(&self) -> Option<Vec<u8>> {
        Some(self.customer.clone().into_bytes())
    }
}

impl Tabular for CustomerRiskBirthday {
    fn columns() -> &'static [&'static str] {
        &["customer", "score", "email", "birthYear"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.customer.clone(),
            format!("{:.1}", self.score),
            self.email.clone(),
            self.birth_year.clone(),
        ]
    }
}
