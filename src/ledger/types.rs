// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::crypto::PackedKey;
use crate::types::ServiceKind;

/// Custodial balance sheet of one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub owner: Address,
    /// Everything the user has in escrow, committed or not
    pub total_balance: U256,
    /// Portion not yet transferred to any provider
    pub available_balance: U256,
    pub inference_providers: BTreeSet<Address>,
    pub fine_tuning_providers: BTreeSet<Address>,
    pub additional_info: String,
    /// Request-signing public key; zero until the user registers one
    pub signer_key: PackedKey,
    pub created_at: u64,
}

impl Ledger {
    pub fn new(owner: Address, signer_key: PackedKey, additional_info: String, now: u64) -> Self {
        Self {
            owner,
            total_balance: U256::zero(),
            available_balance: U256::zero(),
            inference_providers: BTreeSet::new(),
            fine_tuning_providers: BTreeSet::new(),
            additional_info,
            signer_key,
            created_at: now,
        }
    }

    pub fn providers(&self, kind: ServiceKind) -> &BTreeSet<Address> {
        match kind {
            ServiceKind::Inference => &self.inference_providers,
            ServiceKind::FineTuning => &self.fine_tuning_providers,
        }
    }

    pub(crate) fn providers_mut(&mut self, kind: ServiceKind) -> &mut BTreeSet<Address> {
        match kind {
            ServiceKind::Inference => &mut self.inference_providers,
            ServiceKind::FineTuning => &mut self.fine_tuning_providers,
        }
    }
}

/// Read view of a ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerInfo {
    pub user: Address,
    pub total_balance: U256,
    pub available_balance: U256,
    pub inference_providers: Vec<Address>,
    pub fine_tuning_providers: Vec<Address>,
    pub additional_info: String,
    pub signer_key: PackedKey,
}

impl From<&Ledger> for LedgerInfo {
    fn from(ledger: &Ledger) -> Self {
        Self {
            user: ledger.owner,
            total_balance: ledger.total_balance,
            available_balance: ledger.available_balance,
            inference_providers: ledger.inference_providers.iter().copied().collect(),
            fine_tuning_providers: ledger.fine_tuning_providers.iter().copied().collect(),
            additional_info: ledger.additional_info.clone(),
            signer_key: ledger.signer_key,
        }
    }
}
