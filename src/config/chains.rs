// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Context, Result};
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    pub contracts: ContractAddresses,
    pub confirmation_blocks: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractAddresses {
    pub ledger: Address,
    pub inference_serving: Address,
    pub fine_tuning_serving: Address,
}

fn address_from_env(name: &str) -> Result<Address> {
    match std::env::var(name) {
        Ok(raw) => Address::from_str(raw.trim()).map_err(|e| anyhow!("Invalid {}: {}", name, e)),
        Err(_) => Ok(Address::zero()),
    }
}

impl ChainConfig {
    pub fn base_sepolia() -> Self {
        ChainConfig {
            chain_id: 84532,
            name: "Base Sepolia".to_string(),
            rpc_url: std::env::var("BASE_SEPOLIA_RPC_URL")
                .unwrap_or_else(|_| "https://sepolia.base.org".to_string()),
            contracts: ContractAddresses::default(),
            confirmation_blocks: 3,
        }
    }

    /// `RPC_URL`, `CHAIN_ID`, `LEDGER_CONTRACT`, `INFERENCE_CONTRACT`,
    /// `FINE_TUNING_CONTRACT`; unset values fall back to Base Sepolia
    pub fn from_env() -> Result<Self> {
        let preset = Self::base_sepolia();
        let chain_id = match std::env::var("CHAIN_ID") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid CHAIN_ID: {}", e))?,
            Err(_) => preset.chain_id,
        };
        Ok(ChainConfig {
            chain_id,
            name: std::env::var("CHAIN_NAME").unwrap_or(preset.name),
            rpc_url: std::env::var("RPC_URL").unwrap_or(preset.rpc_url),
            contracts: ContractAddresses {
                ledger: address_from_env("LEDGER_CONTRACT")?,
                inference_serving: address_from_env("INFERENCE_CONTRACT")?,
                fine_tuning_serving: address_from_env("FINE_TUNING_CONTRACT")?,
            },
            confirmation_blocks: preset.confirmation_blocks,
        })
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Failed to parse chain config")
    }

    pub fn require_contract(&self, address: Address, name: &str) -> Result<Address> {
        if address.is_zero() {
            return Err(anyhow!(
                "{} contract address not configured for chain {}",
                name,
                self.chain_id
            ));
        }
        Ok(address)
    }
}
