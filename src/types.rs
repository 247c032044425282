// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Amounts are denominated in the chain's native unit (wei)
pub type Amount = ethers::types::U256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceKind {
    Inference,
    FineTuning,
}

impl ServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceKind::Inference => "inference",
            ServiceKind::FineTuning => "fine-tuning",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "inference" => Ok(ServiceKind::Inference),
            "fine-tuning" | "finetuning" | "fine_tuning" => Ok(ServiceKind::FineTuning),
            other => Err(format!("Invalid service kind: {}", other)),
        }
    }
}

/// Identifies one sub-account: user × provider × service kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountKey {
    pub user: Address,
    pub provider: Address,
    pub kind: ServiceKind,
}

impl AccountKey {
    pub fn new(user: Address, provider: Address, kind: ServiceKind) -> Self {
        Self {
            user,
            provider,
            kind,
        }
    }
}
