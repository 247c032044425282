// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ECDSA Signature Recovery
//!
//! Recovers the Ethereum address that produced a 65-byte signature. Settlement
//! uses it to check that a fine-tuning claim was signed by the signer the user
//! acknowledged for that provider.

use anyhow::{anyhow, Result};
use ethers::types::Address;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use tiny_keccak::{Hasher, Keccak};

/// Recover the signer address from a 65-byte `r ‖ s ‖ v` signature
///
/// `v` may be given either as 0/1 or in the Ethereum 27/28 form.
pub fn recover_signer(signature: &[u8], message_hash: &[u8]) -> Result<Address> {
    if signature.len() != 65 {
        return Err(anyhow!(
            "Invalid signature size: expected 65 bytes, got {}",
            signature.len()
        ));
    }

    if message_hash.len() != 32 {
        return Err(anyhow!(
            "Invalid message hash size: expected 32 bytes, got {}",
            message_hash.len()
        ));
    }

    let mut recovery_id = signature[64];
    if recovery_id >= 27 {
        recovery_id -= 27;
    }
    if recovery_id > 3 {
        return Err(anyhow!(
            "Invalid recovery ID: expected 0-3, got {}",
            recovery_id
        ));
    }

    let recovery_id = RecoveryId::from_byte(recovery_id)
        .ok_or_else(|| anyhow!("Failed to parse recovery ID"))?;
    let sig = Signature::from_slice(&signature[..64])
        .map_err(|e| anyhow!("Invalid signature format: {}", e))?;

    let verifying_key = VerifyingKey::recover_from_prehash(message_hash, &sig, recovery_id)
        .map_err(|e| anyhow!("Failed to recover public key: {}", e))?;

    Ok(address_of(&verifying_key))
}

/// Ethereum address of a secp256k1 public key
pub fn address_of(key: &VerifyingKey) -> Address {
    let public_key = key.to_encoded_point(false);

    // Skip the 0x04 prefix byte, keep the last 20 bytes of the hash
    let mut hasher = Keccak::v256();
    let mut hash = [0u8; 32];
    hasher.update(&public_key.as_bytes()[1..]);
    hasher.finalize(&mut hash);

    Address::from_slice(&hash[12..])
}
