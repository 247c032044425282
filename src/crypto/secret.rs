// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Secret Sealing for Fine-tuning Deliverables
//!
//! When a user acknowledges a fine-tuned model, the provider settles the job
//! with the model decryption key sealed to the user's secp256k1 public key.
//! Publishing the sealed secret on-chain completes the delivery: only the
//! ledger owner can open it.
//!
//! ## Sealed Format
//!
//! ```text
//! [ephemeral public key (33 bytes, compressed) | nonce (24 bytes) | ciphertext+tag]
//! ```
//!
//! - Key agreement: ECDH on secp256k1, ephemeral sender key
//! - KDF: HKDF-SHA256, no salt, empty info
//! - AEAD: XChaCha20-Poly1305, AAD = ephemeral public key

use anyhow::{anyhow, Result};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    XChaCha20Poly1305, XNonce,
};
use hkdf::Hkdf;
use k256::{elliptic_curve::sec1::ToEncodedPoint, PublicKey, SecretKey};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use super::error::CryptoError;

const EPHEMERAL_KEY_SIZE: usize = 33;
const NONCE_SIZE: usize = 24;
const TAG_SIZE: usize = 16;

/// Derive a 32-byte symmetric key from an ECDH exchange
///
/// `peer_public` may be compressed (33 bytes) or uncompressed (65 bytes).
pub fn derive_shared_key(peer_public: &[u8], own_private: &[u8]) -> Result<[u8; 32]> {
    if own_private.len() != 32 {
        return Err(anyhow!(
            "Invalid private key size: expected 32 bytes, got {}",
            own_private.len()
        ));
    }
    if peer_public.len() != 33 && peer_public.len() != 65 {
        return Err(anyhow!(
            "Invalid public key size: expected 33 or 65 bytes, got {}",
            peer_public.len()
        ));
    }

    let secret = SecretKey::from_slice(own_private)
        .map_err(|e| anyhow!("Failed to parse private key: {}", e))?;
    let public = PublicKey::from_sec1_bytes(peer_public)
        .map_err(|e| anyhow!("Failed to parse public key: {}", e))?;

    let shared = k256::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());

    let hkdf = Hkdf::<Sha256>::new(None, shared.raw_secret_bytes());
    let mut derived_key = [0u8; 32];
    hkdf.expand(&[], &mut derived_key)
        .map_err(|e| anyhow!("HKDF key derivation failed: {}", e))?;

    Ok(derived_key)
}

/// Seal `secret` so that only the holder of `user_public`'s private key can open it
pub fn seal_secret(user_public: &[u8], secret: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let ephemeral = SecretKey::random(&mut OsRng);
    let ephemeral_public = ephemeral.public_key().to_encoded_point(true);

    let key = derive_shared_key(user_public, &ephemeral.to_bytes()).map_err(|e| {
        CryptoError::KeyDerivationFailed {
            operation: "seal_secret".to_string(),
            reason: e.to_string(),
        }
    })?;

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let cipher = XChaCha20Poly1305::new_from_slice(&key).map_err(|e| {
        CryptoError::EncryptionFailed {
            operation: "seal_secret".to_string(),
            reason: e.to_string(),
        }
    })?;
    let ciphertext = cipher
        .encrypt(
            XNonce::from_slice(&nonce),
            Payload {
                msg: secret,
                aad: ephemeral_public.as_bytes(),
            },
        )
        .map_err(|e| CryptoError::EncryptionFailed {
            operation: "seal_secret".to_string(),
            reason: e.to_string(),
        })?;

    let mut sealed = Vec::with_capacity(EPHEMERAL_KEY_SIZE + NONCE_SIZE + ciphertext.len());
    sealed.extend_from_slice(ephemeral_public.as_bytes());
    sealed.extend_from_slice(&nonce);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

pub fn open_secret(user_private: &[u8], sealed: &[u8]) -> Result<Vec<u8>, CryptoError> {
    if sealed.len() < EPHEMERAL_KEY_SIZE + NONCE_SIZE + TAG_SIZE {
        return Err(CryptoError::InvalidPayload {
            field: "encrypted_secret".to_string(),
            reason: format!("too short: {} bytes", sealed.len()),
        });
    }

    let (ephemeral_public, rest) = sealed.split_at(EPHEMERAL_KEY_SIZE);
    let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

    let key = derive_shared_key(ephemeral_public, user_private).map_err(|e| {
        CryptoError::KeyDerivationFailed {
            operation: "open_secret".to_string(),
            reason: e.to_string(),
        }
    })?;

    let cipher = XChaCha20Poly1305::new_from_slice(&key).map_err(|e| {
        CryptoError::DecryptionFailed {
            operation: "open_secret".to_string(),
            reason: e.to_string(),
        }
    })?;
    cipher
        .decrypt(
            XNonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: ephemeral_public,
            },
        )
        .map_err(|e| CryptoError::DecryptionFailed {
            operation: "open_secret".to_string(),
            reason: format!("authentication error: {}", e),
        })
}
