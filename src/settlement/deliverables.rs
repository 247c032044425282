// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{Address, Bytes};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EscrowError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deliverable {
    pub index: u64,
    pub model_root_hash: Bytes,
    pub acknowledged: bool,
    pub settled: bool,
    /// Secret the provider revealed at settlement, sealed to the user key
    pub encrypted_secret: Option<Bytes>,
    pub created_at: u64,
}

/// Fine-tuning deliverables per (user, provider), indexed in creation order
#[derive(Debug, Default, Clone)]
pub struct DeliverableStore {
    by_pair: HashMap<(Address, Address), Vec<Deliverable>>,
}

impl DeliverableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, user: Address, provider: Address, model_root_hash: Bytes, now: u64) -> u64 {
        let list = self.by_pair.entry((user, provider)).or_default();
        let index = list.len() as u64;
        list.push(Deliverable {
            index,
            model_root_hash,
            acknowledged: false,
            settled: false,
            encrypted_secret: None,
            created_at: now,
        });
        index
    }

    pub fn get(&self, user: Address, provider: Address, index: u64) -> Result<&Deliverable> {
        self.by_pair
            .get(&(user, provider))
            .and_then(|list| list.get(index as usize))
            .ok_or(EscrowError::DeliverableNotFound {
                user,
                provider,
                index,
            })
    }

    fn get_mut(&mut self, user: Address, provider: Address, index: u64) -> Result<&mut Deliverable> {
        self.by_pair
            .get_mut(&(user, provider))
            .and_then(|list| list.get_mut(index as usize))
            .ok_or(EscrowError::DeliverableNotFound {
                user,
                provider,
                index,
            })
    }

    /// One-way false→true transition
    pub fn acknowledge(&mut self, user: Address, provider: Address, index: u64) -> Result<()> {
        let deliverable = self.get_mut(user, provider, index)?;
        if deliverable.acknowledged {
            return Err(EscrowError::DeliverableAcknowledged(index));
        }
        deliverable.acknowledged = true;
        Ok(())
    }

    pub(crate) fn mark_settled(
        &mut self,
        user: Address,
        provider: Address,
        index: u64,
        encrypted_secret: Option<Bytes>,
    ) -> Result<()> {
        let deliverable = self.get_mut(user, provider, index)?;
        deliverable.settled = true;
        deliverable.encrypted_secret = encrypted_secret;
        Ok(())
    }

    pub fn list(&self, user: Address, provider: Address) -> Vec<Deliverable> {
        self.by_pair
            .get(&(user, provider))
            .cloned()
            .unwrap_or_default()
    }

    pub fn remove_user(&mut self, user: Address) -> usize {
        let keys: Vec<_> = self.by_pair.keys().filter(|(u, _)| *u == user).copied().collect();
        keys.iter()
            .filter_map(|k| self.by_pair.remove(k))
            .map(|list| list.len())
            .sum()
    }
}
