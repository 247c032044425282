// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::env_or;

pub const DEFAULT_LOCK_TIME_SECS: u64 = 7200;
pub const DEFAULT_PENALTY_PERCENTAGE: u8 = 30;

/// Runtime parameters of the escrow contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowConfig {
    /// Account allowed to change lock time and penalty
    pub owner: Address,
    /// Delay between a retrieval request and the refund becoming claimable
    #[serde(default = "default_lock_time")]
    pub lock_time_secs: u64,
    /// Share of the task fee paid for an unacknowledged deliverable
    #[serde(default = "default_penalty")]
    pub penalty_percentage: u8,
}

fn default_lock_time() -> u64 {
    DEFAULT_LOCK_TIME_SECS
}

fn default_penalty() -> u8 {
    DEFAULT_PENALTY_PERCENTAGE
}

impl EscrowConfig {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            lock_time_secs: DEFAULT_LOCK_TIME_SECS,
            penalty_percentage: DEFAULT_PENALTY_PERCENTAGE,
        }
    }

    /// `ESCROW_OWNER` (required), `ESCROW_LOCK_TIME_SECS`, `ESCROW_PENALTY_PERCENTAGE`
    pub fn from_env() -> Result<Self> {
        let owner = std::env::var("ESCROW_OWNER")
            .map_err(|_| anyhow!("ESCROW_OWNER environment variable not set"))?
            .parse::<Address>()
            .map_err(|e| anyhow!("Invalid ESCROW_OWNER: {}", e))?;
        let config = Self {
            owner,
            lock_time_secs: env_or("ESCROW_LOCK_TIME_SECS", DEFAULT_LOCK_TIME_SECS)?,
            penalty_percentage: env_or("ESCROW_PENALTY_PERCENTAGE", DEFAULT_PENALTY_PERCENTAGE)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Failed to parse escrow config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        if self.penalty_percentage > 100 {
            return Err(anyhow!(
                "penalty_percentage must be at most 100, got {}",
                self.penalty_percentage
            ));
        }
        Ok(())
    }
}
