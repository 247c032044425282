// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request Signing (EdDSA over a twisted Edwards curve)
//!
//! Users authorise every metered call by signing its 64-byte
//! [`RequestRecord`]. The signing key is an Ed25519 keypair that is separate
//! from the user's wallet key, so a leaked SDK key can only spend what was
//! already transferred to a provider.
//!
//! Keys are exchanged as two field words of 128 bits each, which is the form
//! the settlement proof takes them as public inputs:
//!
//! ```text
//! word[0] = u128::from_le_bytes(key[0..16])
//! word[1] = u128::from_le_bytes(key[16..32])
//! ```
//!
//! Signing is deterministic (RFC 8032) and keeps no state.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use ethers::types::U256;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::CryptoError;
use crate::codec::RequestRecord;

pub const PACKED_SIGNATURE_SIZE: usize = 64;

pub type PackedSignature = [u8; PACKED_SIGNATURE_SIZE];

/// A 32-byte key split into two 128-bit field words
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PackedKey(pub [U256; 2]);

impl PackedKey {
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let mut low = [0u8; 16];
        let mut high = [0u8; 16];
        low.copy_from_slice(&bytes[..16]);
        high.copy_from_slice(&bytes[16..]);
        Self([
            U256::from(u128::from_le_bytes(low)),
            U256::from(u128::from_le_bytes(high)),
        ])
    }

    pub fn to_bytes(&self, key_type: &str) -> Result<[u8; 32], CryptoError> {
        let mut out = [0u8; 32];
        for (i, word) in self.0.iter().enumerate() {
            if word.bits() > 128 {
                return Err(CryptoError::InvalidKey {
                    key_type: key_type.to_string(),
                    reason: format!("word {} exceeds 128 bits", i),
                });
            }
            out[i * 16..(i + 1) * 16].copy_from_slice(&word.low_u128().to_le_bytes());
        }
        Ok(out)
    }

    pub fn is_zero(&self) -> bool {
        self.0[0].is_zero() && self.0[1].is_zero()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestKeyPair {
    pub private_key: PackedKey,
    pub public_key: PackedKey,
}

pub fn generate_keypair() -> RequestKeyPair {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);
    keypair_from_seed(&seed)
}

pub fn keypair_from_seed(seed: &[u8; 32]) -> RequestKeyPair {
    let signing_key = SigningKey::from_bytes(seed);
    RequestKeyPair {
        private_key: PackedKey::from_bytes(seed),
        public_key: PackedKey::from_bytes(signing_key.verifying_key().as_bytes()),
    }
}

fn signing_key(private_key: &PackedKey) -> Result<SigningKey, CryptoError> {
    let seed = private_key.to_bytes("request_private_key")?;
    Ok(SigningKey::from_bytes(&seed))
}

pub fn sign_request(
    record: &RequestRecord,
    private_key: &PackedKey,
) -> Result<PackedSignature, CryptoError> {
    let key = signing_key(private_key)?;
    Ok(key.sign(&record.to_bytes()).to_bytes())
}

/// Sign a run of records with one key, in order
pub fn sign_requests(
    records: &[RequestRecord],
    private_key: &PackedKey,
) -> Result<Vec<PackedSignature>, CryptoError> {
    let key = signing_key(private_key)?;
    debug!("Signing {} request records", records.len());
    Ok(records
        .iter()
        .map(|record| key.sign(&record.to_bytes()).to_bytes())
        .collect())
}

/// Returns `Ok(false)` for a well-formed signature that does not verify
pub fn verify_request(
    record: &RequestRecord,
    signature: &[u8],
    public_key: &PackedKey,
) -> Result<bool, CryptoError> {
    if signature.len() != PACKED_SIGNATURE_SIZE {
        return Err(CryptoError::InvalidSignature {
            operation: "verify_request".to_string(),
            reason: format!(
                "expected {} bytes, got {}",
                PACKED_SIGNATURE_SIZE,
                signature.len()
            ),
        });
    }

    let key_bytes = public_key.to_bytes("request_public_key")?;
    let verifying_key =
        VerifyingKey::from_bytes(&key_bytes).map_err(|e| CryptoError::InvalidKey {
            key_type: "request_public_key".to_string(),
            reason: e.to_string(),
        })?;
    let signature = Signature::from_slice(signature)?;

    Ok(verifying_key
        .verify(&record.to_bytes(), &signature)
        .is_ok())
}
