// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! AES-GCM Encryption for Fine-tuned Model Artifacts
//!
//! The provider encrypts the trained model with a fresh 256-bit key before
//! uploading it. That key is the secret later sealed to the user during
//! settlement.
//!
//! **Format**:
//! ```text
//! [nonce (12 bytes) | ciphertext+tag (variable length)]
//! ```

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use rand::{rngs::OsRng, RngCore};

const NONCE_SIZE: usize = 12;

pub fn generate_model_key() -> [u8; 32] {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    key
}

pub fn encrypt_model(artifact: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    if key.len() != 32 {
        return Err(anyhow!(
            "Invalid key size: expected 32 bytes (256 bits), got {}",
            key.len()
        ));
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| anyhow!("Failed to create AES-GCM cipher: {}", e))?;

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: artifact,
                aad: b"",
            },
        )
        .map_err(|e| anyhow!("AES-GCM encryption failed: {}", e))?;

    let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    out.extend_from_slice(&nonce);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

pub fn decrypt_model(encrypted: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    if encrypted.len() < NONCE_SIZE {
        return Err(anyhow!(
            "Encrypted data too short: expected at least {} bytes for nonce, got {}",
            NONCE_SIZE,
            encrypted.len()
        ));
    }
    if key.len() != 32 {
        return Err(anyhow!(
            "Invalid key size: expected 32 bytes (256 bits), got {}",
            key.len()
        ));
    }

    let (nonce, ciphertext) = encrypted.split_at(NONCE_SIZE);
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| anyhow!("Failed to create AES-GCM cipher: {}", e))?;

    cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: b"",
            },
        )
        .map_err(|e| {
            anyhow!(
                "AES-GCM decryption failed (wrong key or corrupted data): {}",
                e
            )
        })
}
