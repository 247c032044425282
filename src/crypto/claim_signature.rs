// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fine-tuning Claim Signing
//!
//! A provider claims a fine-tuning fee by signing the claim fields with the
//! signer key the user acknowledged for it.
//!
//! ## Signature Formula
//!
//! ```text
//! 1. dataHash = keccak256(abi.encodePacked(
//!        encryptedSecret, modelRootHash, nonce, providerSigner, taskFee, user))
//! 2. signature = personal_sign(dataHash)  // 65 bytes: r(32) + s(32) + v(1)
//! ```
//!
//! `nonce` and `taskFee` are packed as 32-byte big-endian words, addresses
//! as 20 raw bytes.

use anyhow::{anyhow, Result};
use ethers::types::{Address, U256};
use ethers::utils::{hash_message, keccak256};
use k256::ecdsa::SigningKey;
use tracing::debug;

use super::signature::recover_signer;

#[derive(Debug, thiserror::Error)]
pub enum ClaimSigningError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),
}

/// Fields covered by a provider's claim signature
#[derive(Debug, Clone, Copy)]
pub struct ClaimDigest<'a> {
    pub encrypted_secret: &'a [u8],
    pub model_root_hash: &'a [u8],
    pub nonce: U256,
    pub provider_signer: Address,
    pub task_fee: U256,
    pub user: Address,
}

impl ClaimDigest<'_> {
    /// Solidity `abi.encodePacked` of the claim fields
    pub fn encode(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(
            self.encrypted_secret.len() + self.model_root_hash.len() + 32 + 20 + 32 + 20,
        );
        data.extend_from_slice(self.encrypted_secret);
        data.extend_from_slice(self.model_root_hash);

        let mut word = [0u8; 32];
        self.nonce.to_big_endian(&mut word);
        data.extend_from_slice(&word);

        data.extend_from_slice(self.provider_signer.as_bytes());

        self.task_fee.to_big_endian(&mut word);
        data.extend_from_slice(&word);

        data.extend_from_slice(self.user.as_bytes());
        data
    }

    pub fn data_hash(&self) -> [u8; 32] {
        keccak256(self.encode())
    }

    /// Hash actually signed: the data hash behind the Ethereum message prefix
    pub fn signed_hash(&self) -> [u8; 32] {
        hash_message(self.data_hash()).0
    }
}

pub fn sign_claim(private_key: &[u8; 32], digest: &ClaimDigest<'_>) -> Result<[u8; 65]> {
    let signing_key = SigningKey::from_bytes(private_key.into())
        .map_err(|e| anyhow!(ClaimSigningError::InvalidPrivateKey(e.to_string())))?;

    let hash = digest.signed_hash();
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(&hash)
        .map_err(|e| anyhow!(ClaimSigningError::SigningFailed(e.to_string())))?;

    let mut sig_bytes = [0u8; 65];
    sig_bytes[..64].copy_from_slice(&signature.to_bytes());
    sig_bytes[64] = recovery_id.to_byte() + 27;

    debug!("Signed claim for user {:?}, nonce {}", digest.user, digest.nonce);
    Ok(sig_bytes)
}

pub fn recover_claim_signer(signature: &[u8], digest: &ClaimDigest<'_>) -> Result<Address> {
    recover_signer(signature, &digest.signed_hash())
}
