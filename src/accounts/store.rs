// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EscrowError, Result};
use crate::events::BalanceUpdate;
use crate::types::{AccountKey, ServiceKind};

/// Funds a user has committed to one provider for one service kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub user: Address,
    pub provider: Address,
    pub kind: ServiceKind,
    pub balance: U256,
    pub pending_refund: U256,
    /// Unix seconds after which `pending_refund` may be claimed back
    pub refund_unlock_at: u64,
    /// Highest nonce consumed by a settlement
    pub nonce: U256,
    pub last_settlement_at: Option<u64>,
    pub created_at: u64,
}

/// What a retrieval request did to one account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalOutcome {
    /// Balance moved into the pending bucket; unlocks at the given time
    Requested { amount: U256, unlock_at: u64 },
    /// Pending bucket still locked; nothing changed
    StillLocked { unlock_at: u64 },
    /// Pending bucket released back to the ledger
    Released(U256),
    /// Nothing to retrieve
    Empty,
}

impl Account {
    pub fn new(key: AccountKey, now: u64) -> Self {
        Self {
            user: key.user,
            provider: key.provider,
            kind: key.kind,
            balance: U256::zero(),
            pending_refund: U256::zero(),
            refund_unlock_at: 0,
            nonce: U256::zero(),
            last_settlement_at: None,
            created_at: now,
        }
    }

    pub fn key(&self) -> AccountKey {
        AccountKey::new(self.user, self.provider, self.kind)
    }

    /// Value a provider may still draw: the balance plus a pending refund
    /// whose lock window has not yet closed.
    pub fn claimable(&self, now: u64) -> U256 {
        if !self.pending_refund.is_zero() && now < self.refund_unlock_at {
            self.balance.saturating_add(self.pending_refund)
        } else {
            self.balance
        }
    }

    /// Adds funds, first folding any pending refund back into the balance.
    /// Returns the amount of pending refund that was cancelled.
    pub fn credit(&mut self, amount: U256) -> Result<U256> {
        let cancelled = self.pending_refund;
        let balance = self
            .balance
            .checked_add(cancelled)
            .and_then(|b| b.checked_add(amount))
            .ok_or_else(|| EscrowError::InvalidAmount("account balance overflow".to_string()))?;
        self.balance = balance;
        self.pending_refund = U256::zero();
        self.refund_unlock_at = 0;
        Ok(cancelled)
    }

    /// Draws `amount`, taking from the balance before the pending bucket
    pub fn debit(&mut self, amount: U256, now: u64) -> Result<()> {
        let available = self.claimable(now);
        if amount > available {
            return Err(EscrowError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        if amount <= self.balance {
            self.balance -= amount;
        } else {
            let from_pending = amount - self.balance;
            self.balance = U256::zero();
            self.pending_refund -= from_pending;
        }
        Ok(())
    }

    pub fn retrieve(&mut self, now: u64, lock_time: u64) -> RetrievalOutcome {
        if !self.pending_refund.is_zero() {
            if now >= self.refund_unlock_at {
                let released = self.pending_refund;
                self.pending_refund = U256::zero();
                self.refund_unlock_at = 0;
                return RetrievalOutcome::Released(released);
            }
            return RetrievalOutcome::StillLocked {
                unlock_at: self.refund_unlock_at,
            };
        }
        if self.balance.is_zero() {
            return RetrievalOutcome::Empty;
        }
        let amount = self.balance;
        let unlock_at = now.saturating_add(lock_time);
        self.pending_refund = amount;
        self.balance = U256::zero();
        self.refund_unlock_at = unlock_at;
        RetrievalOutcome::Requested { amount, unlock_at }
    }

    pub fn balance_update(&self) -> BalanceUpdate {
        BalanceUpdate {
            user: self.user,
            provider: self.provider,
            kind: self.kind,
            new_balance: self.balance,
            pending_refund: self.pending_refund,
        }
    }

    /// Total value the account still holds on behalf of the ledger
    pub fn held(&self) -> U256 {
        self.balance.saturating_add(self.pending_refund)
    }
}

/// Authoritative store of every account; ledgers only keep provider references
#[derive(Debug, Default, Clone)]
pub struct AccountStore {
    accounts: HashMap<AccountKey, Account>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &AccountKey) -> Option<&Account> {
        self.accounts.get(key)
    }

    pub fn require(&self, key: &AccountKey) -> Result<&Account> {
        self.accounts
            .get(key)
            .ok_or(EscrowError::AccountNotFound {
                user: key.user,
                provider: key.provider,
                kind: key.kind,
            })
    }

    pub fn get_or_create(&mut self, key: AccountKey, now: u64) -> &mut Account {
        self.accounts
            .entry(key)
            .or_insert_with(|| Account::new(key, now))
    }

    pub fn get_mut(&mut self, key: &AccountKey) -> Option<&mut Account> {
        self.accounts.get_mut(key)
    }

    /// Replaces accounts with already-validated copies in one step
    pub fn commit(&mut self, accounts: impl IntoIterator<Item = Account>) {
        for account in accounts {
            self.accounts.insert(account.key(), account);
        }
    }

    pub fn remove_user(&mut self, user: Address) -> Vec<Account> {
        let keys: Vec<AccountKey> = self
            .accounts
            .keys()
            .filter(|k| k.user == user)
            .copied()
            .collect();
        let mut removed: Vec<Account> = keys
            .iter()
            .filter_map(|k| self.accounts.remove(k))
            .collect();
        removed.sort_by_key(|a| (a.kind, a.provider));
        removed
    }

    pub fn for_user(&self, user: Address, kind: Option<ServiceKind>) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .values()
            .filter(|a| a.user == user && kind.map_or(true, |k| a.kind == k))
            .cloned()
            .collect();
        accounts.sort_by_key(|a| (a.kind, a.provider));
        accounts
    }

    pub fn for_provider(&self, provider: Address, kind: ServiceKind) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .values()
            .filter(|a| a.provider == provider && a.kind == kind)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| a.user);
        accounts
    }

    /// Sum of balance and pending refund across one user's accounts
    /// Every account of one service kind, ordered by user then provider
    pub fn all(&self, kind: ServiceKind) -> Vec<Account> {
        let mut accounts: Vec<Account> = self
            .accounts
            .values()
            .filter(|a| a.kind == kind)
            .cloned()
            .collect();
        accounts.sort_by_key(|a| (a.user, a.provider));
        accounts
    }

    pub fn held_by(&self, user: Address) -> U256 {
        self.accounts
            .values()
            .filter(|a| a.user == user)
            .fold(U256::zero(), |acc, a| acc.saturating_add(a.held()))
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
