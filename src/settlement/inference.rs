// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Batched inference fee settlement
//!
//! A provider settles many users at once with one proof. The proof binds
//! each chunk of requests to a user, a nonce range, a fee total and the
//! user's request-signing key; the verifier itself is opaque here.

use ethers::types::{Address, U256};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::proof::{decode_chunks, ProofVerifier};
use super::types::{InferenceClaim, SettlementOutcome};
use crate::accounts::{Account, SignerEntry};
use crate::crypto::PackedKey;
use crate::error::{EscrowError, Result};
use crate::events::BalanceUpdate;
use crate::ledger::EscrowState;
use crate::types::{AccountKey, ServiceKind};

impl EscrowState {
    /// Records the key a user trusts for this provider's inference responses
    pub fn acknowledge_inference_signer(
        &mut self,
        user: Address,
        provider: Address,
        signer_key: PackedKey,
        now: u64,
    ) -> Result<SignerEntry<PackedKey>> {
        self.ledger(user)?;
        let entry = self.inference_signers.acknowledge(
            AccountKey::new(user, provider, ServiceKind::Inference),
            signer_key,
            now,
        );
        info!(
            "User {:?} acknowledged inference signer for provider {:?} (version {})",
            user, provider, entry.version
        );
        Ok(entry)
    }

    /// Validates the whole batch against staged copies, then commits every
    /// account at once. Any failure leaves the state untouched.
    pub fn settle_inference(
        &mut self,
        provider: Address,
        claim: &InferenceClaim,
        verifier: &dyn ProofVerifier,
        now: u64,
    ) -> Result<SettlementOutcome> {
        if claim.num_chunks == 0 {
            return Err(EscrowError::MalformedClaim("claim has no chunks".to_string()));
        }
        if claim.segment_size.iter().any(|s| *s == 0) {
            return Err(EscrowError::MalformedClaim("empty user segment".to_string()));
        }
        let declared: usize = claim
            .segment_size
            .iter()
            .try_fold(0usize, |acc, s| acc.checked_add(*s))
            .ok_or_else(|| EscrowError::MalformedClaim("segment sizes overflow".to_string()))?;
        if declared != claim.num_chunks {
            return Err(EscrowError::MalformedClaim(format!(
                "segments cover {} chunks, claim declares {}",
                declared, claim.num_chunks
            )));
        }
        let chunks = decode_chunks(&claim.public_inputs, claim.num_chunks)?;

        if !verifier.verify(&claim.proof, &claim.public_inputs) {
            warn!("Inference proof from {:?} rejected", provider);
            return Err(EscrowError::InvalidProof("verifier rejected proof".to_string()));
        }

        let mut staged: HashMap<AccountKey, Account> = HashMap::new();
        let mut order: Vec<AccountKey> = Vec::new();
        let mut fees: HashMap<Address, U256> = HashMap::new();
        let mut charged = U256::zero();
        let mut updates: Vec<BalanceUpdate> = Vec::with_capacity(claim.segment_size.len());

        let mut cursor = 0usize;
        for segment in &claim.segment_size {
            let segment_chunks = &chunks[cursor..cursor + segment];
            cursor += segment;

            let user = segment_chunks[0].user;
            let key = AccountKey::new(user, provider, ServiceKind::Inference);
            if !staged.contains_key(&key) {
                let account = self.accounts.require(&key)?.clone();
                staged.insert(key, account);
                order.push(key);
            }
            let signer_key = self.ledger(user)?.signer_key;
            let account = staged
                .get_mut(&key)
                .ok_or(EscrowError::AccountNotFound {
                    user,
                    provider,
                    kind: ServiceKind::Inference,
                })?;

            let mut segment_fee = U256::zero();
            for chunk in segment_chunks {
                if chunk.user != user {
                    return Err(EscrowError::MalformedClaim(format!(
                        "chunk for {:?} inside segment of {:?}",
                        chunk.user, user
                    )));
                }
                if chunk.provider != provider {
                    warn!(
                        "Inference claim from {:?} carries chunk for provider {:?}",
                        provider, chunk.provider
                    );
                    return Err(EscrowError::Unauthorized(format!(
                        "chunk provider {:?} is not the caller",
                        chunk.provider
                    )));
                }
                if signer_key.is_zero() || chunk.signer_key != signer_key {
                    return Err(EscrowError::InvalidSignature(format!(
                        "chunk signer key does not match ledger key of {:?}",
                        user
                    )));
                }
                if chunk.first_nonce <= account.nonce {
                    warn!(
                        "Replayed inference chunk for {:?}: nonce {} <= {}",
                        user, chunk.first_nonce, account.nonce
                    );
                    return Err(EscrowError::NonceConsumed {
                        nonce: chunk.first_nonce,
                        current: account.nonce,
                    });
                }
                if chunk.last_nonce < chunk.first_nonce {
                    return Err(EscrowError::MalformedClaim(format!(
                        "nonce range {}..{} is inverted",
                        chunk.first_nonce, chunk.last_nonce
                    )));
                }
                segment_fee = segment_fee
                    .checked_add(chunk.total_fee)
                    .ok_or(EscrowError::FeeOverflow)?;
                account.nonce = chunk.last_nonce;
            }

            account.debit(segment_fee, now)?;
            account.last_settlement_at = Some(now);
            charged = charged.checked_add(segment_fee).ok_or(EscrowError::FeeOverflow)?;
            let user_fee = fees.entry(user).or_default();
            *user_fee = user_fee.checked_add(segment_fee).ok_or(EscrowError::FeeOverflow)?;
            updates.push(account.balance_update());
            debug!("Inference segment for {:?} charges {}", user, segment_fee);
        }

        for (user, fee) in fees {
            self.book_fee(user, provider, fee)?;
        }
        let users = order.len();
        self.accounts
            .commit(order.into_iter().filter_map(|k| staged.remove(&k)));

        info!(
            "Settled inference batch from {:?}: {} chunks, {} users, {} wei",
            provider, claim.num_chunks, users, charged
        );
        Ok(SettlementOutcome {
            provider,
            kind: ServiceKind::Inference,
            charged,
            updates,
        })
    }
}
