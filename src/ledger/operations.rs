// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{Address, U256};
use serde::Serialize;
use tracing::{info, warn};

use super::state::EscrowState;
use super::types::{Ledger, LedgerInfo};
use crate::accounts::{Account, RetrievalOutcome};
use crate::crypto::PackedKey;
use crate::error::{EscrowError, Result};
use crate::events::BalanceUpdate;
use crate::types::{AccountKey, ServiceKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferOutcome {
    pub ledger: LedgerInfo,
    pub update: BalanceUpdate,
    /// Pending refund folded back into the balance by this transfer
    pub cancelled_refund: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetrievalReport {
    pub ledger: LedgerInfo,
    pub outcomes: Vec<(Address, RetrievalOutcomeKind)>,
    pub updates: Vec<BalanceUpdate>,
}

/// Serializable mirror of [`RetrievalOutcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RetrievalOutcomeKind {
    Requested { amount: U256, unlock_at: u64 },
    StillLocked { unlock_at: u64 },
    Released(U256),
    Empty,
}

impl From<RetrievalOutcome> for RetrievalOutcomeKind {
    fn from(outcome: RetrievalOutcome) -> Self {
        match outcome {
            RetrievalOutcome::Requested { amount, unlock_at } => {
                RetrievalOutcomeKind::Requested { amount, unlock_at }
            }
            RetrievalOutcome::StillLocked { unlock_at } => {
                RetrievalOutcomeKind::StillLocked { unlock_at }
            }
            RetrievalOutcome::Released(amount) => RetrievalOutcomeKind::Released(amount),
            RetrievalOutcome::Empty => RetrievalOutcomeKind::Empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedLedger {
    pub ledger: LedgerInfo,
    /// Every account that belonged to the ledger, both service kinds
    pub accounts: Vec<Account>,
    /// Value returned to the user
    pub refunded: U256,
}

fn require_positive(amount: U256, what: &str) -> Result<()> {
    if amount.is_zero() {
        return Err(EscrowError::InvalidAmount(format!("{} must be positive", what)));
    }
    Ok(())
}

impl EscrowState {
    pub fn add_ledger(
        &mut self,
        user: Address,
        signer_key: PackedKey,
        additional_info: String,
        value: U256,
        now: u64,
    ) -> Result<LedgerInfo> {
        if self.ledgers.contains_key(&user) {
            warn!("Rejected addLedger for {:?}: ledger exists", user);
            return Err(EscrowError::LedgerExists(user));
        }
        let mut ledger = Ledger::new(user, signer_key, additional_info, now);
        ledger.total_balance = value;
        ledger.available_balance = value;
        let info = LedgerInfo::from(&ledger);
        self.ledgers.insert(user, ledger);
        info!("Ledger created for {:?} with {} wei", user, value);
        Ok(info)
    }

    pub fn deposit(&mut self, user: Address, amount: U256, now: u64) -> Result<LedgerInfo> {
        require_positive(amount, "deposit")?;
        let ledger = self
            .ledgers
            .entry(user)
            .or_insert_with(|| Ledger::new(user, PackedKey::default(), String::new(), now));
        let total = ledger
            .total_balance
            .checked_add(amount)
            .ok_or_else(|| EscrowError::InvalidAmount("ledger balance overflow".to_string()))?;
        ledger.total_balance = total;
        ledger.available_balance += amount;
        info!(
            "Deposit of {} wei for {:?}, total {}",
            amount, user, ledger.total_balance
        );
        Ok(LedgerInfo::from(&*ledger))
    }

    pub fn refund(&mut self, user: Address, amount: U256) -> Result<LedgerInfo> {
        require_positive(amount, "refund")?;
        let ledger = self.ledger_mut(user)?;
        if amount > ledger.available_balance {
            warn!(
                "Refund of {} rejected for {:?}: available {}",
                amount, user, ledger.available_balance
            );
            return Err(EscrowError::InsufficientBalance {
                required: amount,
                available: ledger.available_balance,
            });
        }
        ledger.available_balance -= amount;
        ledger.total_balance -= amount;
        info!("Refunded {} wei to {:?}", amount, user);
        Ok(LedgerInfo::from(&*ledger))
    }

    pub fn transfer_fund(
        &mut self,
        user: Address,
        provider: Address,
        kind: ServiceKind,
        amount: U256,
        now: u64,
    ) -> Result<TransferOutcome> {
        require_positive(amount, "transfer")?;
        let key = AccountKey::new(user, provider, kind);

        // Validate on copies so a failure leaves no trace
        let ledger = self.ledger(user)?;
        if amount > ledger.available_balance {
            warn!(
                "Transfer of {} to {:?} rejected for {:?}: available {}",
                amount, provider, user, ledger.available_balance
            );
            return Err(EscrowError::InsufficientBalance {
                required: amount,
                available: ledger.available_balance,
            });
        }
        let mut account = self
            .accounts
            .get(&key)
            .cloned()
            .unwrap_or_else(|| Account::new(key, now));
        let cancelled_refund = account.credit(amount)?;

        let ledger = self.ledger_mut(user)?;
        ledger.available_balance -= amount;
        ledger.providers_mut(kind).insert(provider);
        let info = LedgerInfo::from(&*ledger);
        let update = account.balance_update();
        self.accounts.commit([account]);

        if !cancelled_refund.is_zero() {
            info!(
                "Transfer to {:?} ({}) cancelled pending refund of {} for {:?}",
                provider, kind, cancelled_refund, user
            );
        }
        info!(
            "Transferred {} wei from {:?} to {:?} ({}), balance {}",
            amount, user, provider, kind, update.new_balance
        );
        Ok(TransferOutcome {
            ledger: info,
            update,
            cancelled_refund,
        })
    }

    pub fn retrieve_fund(
        &mut self,
        user: Address,
        providers: &[Address],
        kind: ServiceKind,
        now: u64,
    ) -> Result<RetrievalReport> {
        self.ledger(user)?;
        let mut unique: Vec<Address> = Vec::with_capacity(providers.len());
        for provider in providers {
            if !unique.contains(provider) {
                unique.push(*provider);
            }
        }

        let mut staged = Vec::with_capacity(unique.len());
        for provider in &unique {
            let key = AccountKey::new(user, *provider, kind);
            staged.push(self.accounts.require(&key)?.clone());
        }

        let lock_time = self.params.lock_time_secs;
        let mut released = U256::zero();
        let mut outcomes = Vec::with_capacity(staged.len());
        let mut updates = Vec::new();
        for account in staged.iter_mut() {
            let outcome = account.retrieve(now, lock_time);
            match outcome {
                RetrievalOutcome::Released(amount) => {
                    released = released.saturating_add(amount);
                    updates.push(account.balance_update());
                }
                RetrievalOutcome::Requested { .. } => updates.push(account.balance_update()),
                RetrievalOutcome::StillLocked { .. } | RetrievalOutcome::Empty => {}
            }
            outcomes.push((account.provider, outcome.into()));
        }

        self.accounts.commit(staged);
        let ledger = self.ledger_mut(user)?;
        ledger.available_balance = ledger.available_balance.saturating_add(released);
        info!(
            "Retrieval for {:?} across {} {} providers released {} wei",
            user,
            unique.len(),
            kind,
            released
        );
        Ok(RetrievalReport {
            ledger: LedgerInfo::from(&*ledger),
            outcomes,
            updates,
        })
    }

    pub fn delete_ledger(&mut self, user: Address) -> Result<DeletedLedger> {
        let ledger = self
            .ledgers
            .remove(&user)
            .ok_or(EscrowError::LedgerNotFound(user))?;
        let accounts = self.accounts.remove_user(user);
        let signers = self.fine_tuning_signers.remove_user(user)
            + self.inference_signers.remove_user(user);
        let deliverables = self.deliverables.remove_user(user);
        info!(
            "Deleted ledger for {:?}: {} accounts, {} signer acknowledgements, {} deliverables, {} wei returned",
            user,
            accounts.len(),
            signers,
            deliverables,
            ledger.total_balance
        );
        Ok(DeletedLedger {
            ledger: LedgerInfo::from(&ledger),
            accounts,
            refunded: ledger.total_balance,
        })
    }

    pub fn update_additional_info(&mut self, user: Address, info: String) -> Result<LedgerInfo> {
        let ledger = self.ledger_mut(user)?;
        ledger.additional_info = info;
        Ok(LedgerInfo::from(&*ledger))
    }

    pub fn get_ledger(&self, user: Address) -> Result<LedgerInfo> {
        self.ledger(user).map(LedgerInfo::from)
    }

    pub fn all_ledgers(&self) -> Vec<LedgerInfo> {
        let mut ledgers: Vec<LedgerInfo> = self.ledgers.values().map(LedgerInfo::from).collect();
        ledgers.sort_by_key(|l| l.user);
        ledgers
    }
}
