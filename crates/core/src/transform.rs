// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure record transforms
//!
//! A transform maps one decoded record to at most one output record. It
//! holds no state and gives the same answer for the same input.

use crate::record::DecodedRecord;
use crate::schema::{BirthYear, Customer, Line, RiskEvent, RiskScore, Station, TransformedStation};

/// Maps `DecodedRecord<In>` to a `DecodedRecord<Out>` or drops it
pub trait Transform<In> {
    type Out;

    fn transform(&self, input: DecodedRecord<In>) -> Option<DecodedRecord<Self::Out>>;
}

/// One category choice within a precedence list
pub struct CategoryRule<T, C> {
    pub category: C,
    pub applies: fn(&T) -> bool,
}

/// Pick the first category whose rule applies, in declared order.
///
/// Falls back to `default` when no rule applies.
pub fn select_category<T, C: Copy>(input: &T, rules: &[CategoryRule<T, C>], default: C) -> C {
    rules
        .iter()
        .find(|rule| (rule.applies)(input))
        .map(|rule| rule.category)
        .unwrap_or(default)
}

/// Line precedence: red, then blue. Stations with neither flag are green,
/// whether or not their green flag is set.
pub const LINE_PRECEDENCE: [CategoryRule<Station, Line>; 2] = [
    CategoryRule {
        category: Line::Red,
        applies: is_red,
    },
    CategoryRule {
        category: Line::Blue,
        applies: is_blue,
    },
];

fn is_red(station: &Station) -> bool {
    station.red
}

fn is_blue(station: &Station) -> bool {
    station.blue
}

pub const DEFAULT_LINE: Line = Line::Green;

/// Station event to its table row, deriving the line label
#[derive(Debug, Clone, Copy, Default)]
pub struct StationLine;

impl StationLine {
    pub fn line_for(station: &Station) -> Line {
        select_category(station, &LINE_PRECEDENCE, DEFAULT_LINE)
    }
}

impl Transform<Station> for StationLine {
    type Out = TransformedStation;

    fn transform(&self, input: DecodedRecord<Station>) -> Option<DecodedRecord<TransformedStation>> {
        Some(input.map(|station| TransformedStation {
            line: Self::line_for(&station),
            station_id: station.station_id,
            station_name: station.station_name,
            order: station.order,
        }))
    }
}

/// Customer profile to email and birth year.
///
/// Customers without an email or birthday are dropped. The year is the
/// text before the first `-` of the birthday.
#[derive(Debug, Clone, Copy, Default)]
pub struct CustomerBirthYear;

impl Transform<Customer> for CustomerBirthYear {
    type Out = BirthYear;

    fn transform(&self, input: DecodedRecord<Customer>) -> Option<DecodedRecord<BirthYear>> {
        let email = input.value.email.clone()?;
        let birth_day = input.value.birth_day.as_deref()?;
        let birth_year = birth_day.split('-').next().unwrap_or_default().to_string();
        Some(input.map(|_| BirthYear { email, birth_year }))
    }
}

/// Risk event to the fields used in the join
#[derive(Debug, Clone, Copy, Default)]
pub struct RiskProjection;

impl Transform<RiskEvent> for RiskProjection {
    type Out = RiskScore;

    fn transform(&self, input: DecodedRecord<RiskEvent>) -> Option<DecodedRecord<RiskScore>> {
        Some(input.map(|event| RiskScore {
            customer: event.customer,
            score: event.score,
        }))
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
