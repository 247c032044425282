// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::AccountKey;

/// One acknowledged provider signer. Re-acknowledging replaces the signer
/// and bumps `version`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerEntry<K> {
    pub signer: K,
    pub version: u64,
    pub acknowledged_at: u64,
}

/// Provider signers acknowledged by users, keyed by account
#[derive(Debug, Clone)]
pub struct SignerRegistry<K> {
    entries: HashMap<AccountKey, SignerEntry<K>>,
}

impl<K> Default for SignerRegistry<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Clone + PartialEq> SignerRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acknowledge(&mut self, key: AccountKey, signer: K, now: u64) -> SignerEntry<K> {
        let version = self.entries.get(&key).map_or(1, |e| e.version + 1);
        let entry = SignerEntry {
            signer,
            version,
            acknowledged_at: now,
        };
        self.entries.insert(key, entry.clone());
        entry
    }

    pub fn get(&self, key: &AccountKey) -> Option<&SignerEntry<K>> {
        self.entries.get(key)
    }

    pub fn is_current(&self, key: &AccountKey, signer: &K) -> bool {
        self.entries.get(key).map_or(false, |e| &e.signer == signer)
    }

    pub fn remove_user(&mut self, user: Address) -> usize {
        let before = self.entries.len();
        self.entries.retain(|k, _| k.user != user);
        before - self.entries.len()
    }
}
