// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use ethers::types::U256;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::env_or;

/// Error substrings that mean "try again with more gas"
pub const DEFAULT_TRANSIENT_ERRORS: &[&str] = &[
    "replacement transaction underpriced",
    "replacement fee too low",
    "transaction underpriced",
    "fee too low",
    "max fee per gas less than block base fee",
    "nonce too low",
    "already known",
    "timeout",
    "mempool is full",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmitterConfig {
    /// How long to wait for a receipt before escalating
    pub attempt_timeout_ms: u64,
    /// Gas price multiplier per escalation, in percent (110 = +10%)
    pub gas_step_percent: u64,
    pub max_attempts: u32,
    /// Wall-clock budget for one submission
    pub max_elapsed_ms: u64,
    /// Pending-minus-confirmed nonce gap that triggers nonce reuse
    pub nonce_drift_threshold: u64,
    /// Cap used when the caller supplies none
    pub default_max_gas_price: Option<U256>,
    pub receipt_poll_interval_ms: u64,
    pub transient_errors: Vec<String>,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_ms: 60_000,
            gas_step_percent: 110,
            max_attempts: 10,
            max_elapsed_ms: 15 * 60_000,
            nonce_drift_threshold: 5,
            default_max_gas_price: None,
            receipt_poll_interval_ms: 1_000,
            transient_errors: DEFAULT_TRANSIENT_ERRORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SubmitterConfig {
    /// `SUBMITTER_*` variables override the defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let default_max_gas_price = match std::env::var("SUBMITTER_MAX_GAS_PRICE") {
            Ok(raw) => Some(
                U256::from_dec_str(raw.trim())
                    .map_err(|e| anyhow!("Invalid SUBMITTER_MAX_GAS_PRICE: {}", e))?,
            ),
            Err(_) => None,
        };
        let transient_errors = match std::env::var("SUBMITTER_TRANSIENT_ERRORS") {
            Ok(raw) => raw
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Err(_) => defaults.transient_errors.clone(),
        };
        let config = Self {
            attempt_timeout_ms: env_or("SUBMITTER_ATTEMPT_TIMEOUT_MS", defaults.attempt_timeout_ms)?,
            gas_step_percent: env_or("SUBMITTER_GAS_STEP_PERCENT", defaults.gas_step_percent)?,
            max_attempts: env_or("SUBMITTER_MAX_ATTEMPTS", defaults.max_attempts)?,
            max_elapsed_ms: env_or("SUBMITTER_MAX_ELAPSED_MS", defaults.max_elapsed_ms)?,
            nonce_drift_threshold: env_or(
                "SUBMITTER_NONCE_DRIFT_THRESHOLD",
                defaults.nonce_drift_threshold,
            )?,
            default_max_gas_price,
            receipt_poll_interval_ms: env_or(
                "SUBMITTER_RECEIPT_POLL_MS",
                defaults.receipt_poll_interval_ms,
            )?,
            transient_errors,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Failed to parse submitter config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.gas_step_percent <= 100 {
            return Err(anyhow!(
                "gas_step_percent must exceed 100, got {}",
                self.gas_step_percent
            ));
        }
        if self.max_attempts == 0 {
            return Err(anyhow!("max_attempts must be at least 1"));
        }
        Ok(())
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }

    pub fn max_elapsed(&self) -> Duration {
        Duration::from_millis(self.max_elapsed_ms)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}
