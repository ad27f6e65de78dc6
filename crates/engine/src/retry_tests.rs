// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn policy() -> RetryPolicy {
    RetryPolicy::new(5, Duration::from_millis(200), Duration::from_secs(5))
}

#[parameterized(
    first = { 1, 200 },
    second = { 2, 400 },
    third = { 3, 800 },
    fifth = { 5, 3_200 },
    capped = { 6, 5_000 },
    far_out = { 40, 5_000 },
)]
fn delay_doubles_until_capped(attempt: u32, expected_ms: u64) {
    assert_eq!(policy().delay(attempt), Duration::from_millis(expected_ms));
}

#[test]
fn limit_is_at_least_one() {
    assert_eq!(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO).limit, 1);
}

#[test]
fn default_follows_config_defaults() {
    assert_eq!(RetryPolicy::default(), policy());
}

#[test]
fn zero_base_never_waits() {
    let policy = RetryPolicy::new(3, Duration::ZERO, Duration::from_secs(1));
    assert_eq!(policy.delay(3), Duration::ZERO);
}
