// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{Address, U256};
use std::collections::HashMap;

use super::types::Ledger;
use crate::accounts::{AccountStore, SignerRegistry};
use crate::config::EscrowConfig;
use crate::crypto::PackedKey;
use crate::error::{EscrowError, Result};
use crate::registry::{FineTuningService, InferenceService, ServiceRegistry};
use crate::settlement::DeliverableStore;

/// Parameters the contract owner can change at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EscrowParams {
    pub lock_time_secs: u64,
    pub penalty_percentage: u8,
}

impl From<&EscrowConfig> for EscrowParams {
    fn from(config: &EscrowConfig) -> Self {
        Self {
            lock_time_secs: config.lock_time_secs,
            penalty_percentage: config.penalty_percentage,
        }
    }
}

/// Everything the escrow tracks. Callers hold one write guard per
/// operation; each operation validates before it mutates.
#[derive(Debug, Clone)]
pub struct EscrowState {
    pub(crate) params: EscrowParams,
    pub(crate) ledgers: HashMap<Address, Ledger>,
    pub(crate) accounts: AccountStore,
    pub(crate) fine_tuning_signers: SignerRegistry<Address>,
    pub(crate) inference_signers: SignerRegistry<PackedKey>,
    pub(crate) inference_services: ServiceRegistry<InferenceService>,
    pub(crate) fine_tuning_services: ServiceRegistry<FineTuningService>,
    pub(crate) deliverables: DeliverableStore,
    pub(crate) provider_earnings: HashMap<Address, U256>,
}

impl EscrowState {
    pub fn new(params: EscrowParams) -> Self {
        Self {
            params,
            ledgers: HashMap::new(),
            accounts: AccountStore::new(),
            fine_tuning_signers: SignerRegistry::new(),
            inference_signers: SignerRegistry::new(),
            inference_services: ServiceRegistry::new(),
            fine_tuning_services: ServiceRegistry::new(),
            deliverables: DeliverableStore::new(),
            provider_earnings: HashMap::new(),
        }
    }

    pub fn params(&self) -> EscrowParams {
        self.params
    }

    pub fn accounts(&self) -> &AccountStore {
        &self.accounts
    }

    pub fn deliverables(&self) -> &DeliverableStore {
        &self.deliverables
    }

    pub fn inference_services(&self) -> &ServiceRegistry<InferenceService> {
        &self.inference_services
    }

    pub fn fine_tuning_services(&self) -> &ServiceRegistry<FineTuningService> {
        &self.fine_tuning_services
    }

    pub fn fine_tuning_signers(&self) -> &SignerRegistry<Address> {
        &self.fine_tuning_signers
    }

    pub fn inference_signers(&self) -> &SignerRegistry<PackedKey> {
        &self.inference_signers
    }

    pub fn ledger(&self, user: Address) -> Result<&Ledger> {
        self.ledgers.get(&user).ok_or(EscrowError::LedgerNotFound(user))
    }

    pub(crate) fn ledger_mut(&mut self, user: Address) -> Result<&mut Ledger> {
        self.ledgers
            .get_mut(&user)
            .ok_or(EscrowError::LedgerNotFound(user))
    }

    pub fn earnings(&self, provider: Address) -> U256 {
        self.provider_earnings
            .get(&provider)
            .copied()
            .unwrap_or_default()
    }

    /// `total == available + Σ account balances + Σ pending refunds`
    pub fn ledger_balanced(&self, user: Address) -> bool {
        match self.ledgers.get(&user) {
            Some(ledger) => {
                ledger.available_balance.saturating_add(self.accounts.held_by(user))
                    == ledger.total_balance
            }
            None => self.accounts.held_by(user).is_zero(),
        }
    }

    pub fn set_lock_time(&mut self, secs: u64) {
        self.params.lock_time_secs = secs;
    }

    pub fn set_penalty_percentage(&mut self, percentage: u8) -> Result<()> {
        if percentage > 100 {
            return Err(EscrowError::InvalidPenaltyPercentage(percentage));
        }
        self.params.penalty_percentage = percentage;
        Ok(())
    }

    /// Moves a settled fee out of the user's ledger and into provider earnings
    pub(crate) fn book_fee(&mut self, user: Address, provider: Address, fee: U256) -> Result<()> {
        let ledger = self.ledger_mut(user)?;
        ledger.total_balance = ledger.total_balance.saturating_sub(fee);
        let earned = self.provider_earnings.entry(provider).or_default();
        *earned = earned.saturating_add(fee);
        Ok(())
    }
}
