// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod chains;
pub mod escrow;
pub mod submitter;

pub use chains::{ChainConfig, ContractAddresses};
pub use escrow::EscrowConfig;
pub use submitter::SubmitterConfig;

use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Reads an env var and parses it, falling back to `default` when unset
pub(crate) fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid value for {}: {}", name, e)),
        Err(_) => Ok(default),
    }
}
