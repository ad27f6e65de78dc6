// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded exponential backoff for sink writes

use std::time::Duration;
use trib_core::PipelineConfig;

/// How many times a sink write is attempted and how long to wait between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub limit: u32,
    /// Delay after the first failure
    pub base: Duration,
    /// Upper bound on any single delay
    pub max: Duration,
}

impl RetryPolicy {
    pub fn new(limit: u32, base: Duration, max: Duration) -> Self {
        Self {
            limit: limit.max(1),
            base,
            max,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.sink_retry_limit,
            config.sink_retry_backoff,
            config.sink_retry_backoff_max,
        )
    }

    /// Delay after failed attempt number `attempt` (1-based); doubles each
    /// time up to `max`
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.max)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
