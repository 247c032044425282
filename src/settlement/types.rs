// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::crypto::ClaimDigest;
use crate::events::BalanceUpdate;
use crate::types::ServiceKind;

/// A provider's claim for one fine-tuning deliverable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineTuningClaim {
    pub index: u64,
    pub encrypted_secret: Bytes,
    pub model_root_hash: Bytes,
    pub nonce: U256,
    pub provider_signer: Address,
    /// 65-byte personal-sign signature by `provider_signer`
    pub signature: Bytes,
    pub task_fee: U256,
    pub user: Address,
}

impl FineTuningClaim {
    pub fn digest(&self) -> ClaimDigest<'_> {
        ClaimDigest {
            encrypted_secret: &self.encrypted_secret,
            model_root_hash: &self.model_root_hash,
            nonce: self.nonce,
            provider_signer: self.provider_signer,
            task_fee: self.task_fee,
            user: self.user,
        }
    }
}

/// A batched inference claim. `public_inputs` is `num_chunks` chunks of
/// seven words; `segment_size[i]` consecutive chunks belong to the i-th user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceClaim {
    pub proof: Bytes,
    pub public_inputs: Vec<U256>,
    pub num_chunks: usize,
    pub segment_size: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementOutcome {
    pub provider: Address,
    pub kind: ServiceKind,
    /// Total debited across all users in the claim
    pub charged: U256,
    pub updates: Vec<BalanceUpdate>,
}
