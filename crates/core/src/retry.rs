// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exponential-backoff retry policy.
//!
//! Pure decisions only: the policy computes delays and says whether a
//! retry is allowed; the runner manager owns the actual scheduling and
//! honors cancellation during the wait.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry configuration for crashed runners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retry crashed runners at all (`retry.on_crash`)
    #[serde(default = "default_on_crash")]
    pub on_crash: bool,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_base_backoff_s")]
    pub base_backoff_s: f64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default = "default_cap_s")]
    pub cap_s: f64,
}

fn default_on_crash() -> bool {
    true
}

fn default_max_retries() -> u32 {
    3
}

fn default_base_backoff_s() -> f64 {
    5.0
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_cap_s() -> f64 {
    300.0
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            on_crash: default_on_crash(),
            max_retries: default_max_retries(),
            base_backoff_s: default_base_backoff_s(),
            multiplier: default_multiplier(),
            cap_s: default_cap_s(),
        }
    }
}

/// Pure backoff/should-retry decisions over a [`RetryConfig`].
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn max_retries(&self) -> u32 {
        self.config.max_retries
    }

    /// Delay before retry number `n` (0-based): `min(base * multiplier^n, cap)`.
    pub fn backoff(&self, n: u32) -> Duration {
        let secs = self.config.base_backoff_s * self.config.multiplier.powi(n as i32);
        Duration::from_secs_f64(secs.min(self.config.cap_s))
    }

    /// Whether a runner that has already retried `n` times and last
    /// exited with `last_exit` should be retried again. A missing exit
    /// code (spawn failure, vanished process) counts as a failure.
    pub fn should_retry(&self, n: u32, last_exit: Option<i32>) -> bool {
        self.config.on_crash && n < self.config.max_retries && last_exit != Some(0)
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
