// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fine-tuning fee settlement
//!
//! The provider commits a deliverable, the user acknowledges it, and the
//! provider claims the fee by revealing the model secret. Without an
//! acknowledgement the provider may still claim, but only the penalty share
//! and without revealing anything.

use ethers::types::{Address, Bytes, U256};
use tracing::{info, warn};

use super::types::{FineTuningClaim, SettlementOutcome};
use crate::accounts::SignerEntry;
use crate::crypto::recover_claim_signer;
use crate::error::{EscrowError, Result};
use crate::ledger::EscrowState;
use crate::types::{AccountKey, ServiceKind};

/// Fee owed for an unacknowledged deliverable
pub fn penalty_fee(task_fee: U256, penalty_percentage: u8) -> U256 {
    task_fee.saturating_mul(U256::from(penalty_percentage)) / U256::from(100u8)
}

impl EscrowState {
    /// Records the signer the user trusts to sign this provider's claims
    pub fn acknowledge_fine_tuning_signer(
        &mut self,
        user: Address,
        provider: Address,
        signer: Address,
        now: u64,
    ) -> Result<SignerEntry<Address>> {
        self.ledger(user)?;
        let entry = self.fine_tuning_signers.acknowledge(
            AccountKey::new(user, provider, ServiceKind::FineTuning),
            signer,
            now,
        );
        info!(
            "User {:?} acknowledged signer {:?} for provider {:?} (version {})",
            user, signer, provider, entry.version
        );
        Ok(entry)
    }

    pub fn add_deliverable(
        &mut self,
        provider: Address,
        user: Address,
        model_root_hash: Bytes,
        now: u64,
    ) -> Result<u64> {
        if model_root_hash.is_empty() {
            return Err(EscrowError::MalformedClaim(
                "model root hash must not be empty".to_string(),
            ));
        }
        self.accounts
            .require(&AccountKey::new(user, provider, ServiceKind::FineTuning))?;
        let index = self.deliverables.add(user, provider, model_root_hash, now);
        info!(
            "Provider {:?} added deliverable {} for user {:?}",
            provider, index, user
        );
        Ok(index)
    }

    pub fn acknowledge_deliverable(&mut self, user: Address, provider: Address, index: u64) -> Result<()> {
        self.ledger(user)?;
        self.deliverables.acknowledge(user, provider, index)?;
        info!(
            "User {:?} acknowledged deliverable {} from provider {:?}",
            user, index, provider
        );
        Ok(())
    }

    pub fn settle_fine_tuning(
        &mut self,
        provider: Address,
        claim: &FineTuningClaim,
        now: u64,
    ) -> Result<SettlementOutcome> {
        let key = AccountKey::new(claim.user, provider, ServiceKind::FineTuning);
        let mut account = self.accounts.require(&key)?.clone();

        if claim.nonce <= account.nonce {
            warn!(
                "Replayed fine-tuning claim from {:?}: nonce {} <= {}",
                provider, claim.nonce, account.nonce
            );
            return Err(EscrowError::NonceConsumed {
                nonce: claim.nonce,
                current: account.nonce,
            });
        }
        let deliverable = self.deliverables.get(claim.user, provider, claim.index)?;
        if deliverable.settled {
            warn!(
                "Replayed fine-tuning claim from {:?}: deliverable {} already settled",
                provider, claim.index
            );
            return Err(EscrowError::DeliverableSettled(claim.index));
        }

        let claimable = account.claimable(now);
        if claim.task_fee > claimable {
            return Err(EscrowError::InsufficientBalance {
                required: claim.task_fee,
                available: claimable,
            });
        }

        if deliverable.model_root_hash != claim.model_root_hash {
            return Err(EscrowError::ModelRootHashMismatch(claim.index));
        }

        if !self
            .fine_tuning_signers
            .is_current(&key, &claim.provider_signer)
        {
            return Err(EscrowError::SignerNotAcknowledged {
                user: claim.user,
                provider,
            });
        }
        let recovered = recover_claim_signer(&claim.signature, &claim.digest())
            .map_err(|e| EscrowError::InvalidSignature(e.to_string()))?;
        if recovered != claim.provider_signer {
            warn!(
                "Fine-tuning claim signed by {:?}, expected {:?}",
                recovered, claim.provider_signer
            );
            return Err(EscrowError::InvalidSignature(format!(
                "recovered {:?}, expected {:?}",
                recovered, claim.provider_signer
            )));
        }

        let (fee, secret) = if deliverable.acknowledged {
            if claim.encrypted_secret.is_empty() {
                return Err(EscrowError::SecretRequired);
            }
            (claim.task_fee, Some(claim.encrypted_secret.clone()))
        } else {
            if !claim.encrypted_secret.is_empty() {
                return Err(EscrowError::SecretNotAllowed);
            }
            (penalty_fee(claim.task_fee, self.params.penalty_percentage), None)
        };
        let acknowledged = deliverable.acknowledged;

        account.debit(fee, now)?;
        account.nonce = claim.nonce;
        account.last_settlement_at = Some(now);
        let update = account.balance_update();

        self.book_fee(claim.user, provider, fee)?;
        self.deliverables
            .mark_settled(claim.user, provider, claim.index, secret)?;
        self.accounts.commit([account]);

        info!(
            "Settled fine-tuning deliverable {} for {:?}: charged {} of {} ({}), balance {}",
            claim.index,
            claim.user,
            fee,
            claim.task_fee,
            if acknowledged { "acknowledged" } else { "penalty" },
            update.new_balance
        );
        Ok(SettlementOutcome {
            provider,
            kind: ServiceKind::FineTuning,
            charged: fee,
            updates: vec![update],
        })
    }
}
