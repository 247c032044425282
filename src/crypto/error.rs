// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Crypto Error Types
//!
//! Error type shared by request signing, claim signatures and secret sealing.
//!
//! ## Error Variants
//!
//! - **InvalidSignature**: EdDSA verification or ECDSA recovery failed
//! - **InvalidKey**: Key has the wrong size, is not a curve point, or a packed
//!   word does not fit in 128 bits
//! - **EncryptionFailed**: AEAD encryption failed
//! - **DecryptionFailed**: AEAD decryption failed (wrong key, tampered data)
//! - **KeyDerivationFailed**: ECDH or HKDF key derivation failed
//! - **InvalidPayload**: Encoded payload is truncated or malformed
//! - **Other**: Generic error for library errors or unexpected failures

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    InvalidSignature {
        /// Which operation was being performed
        operation: String,
        reason: String,
    },

    InvalidKey {
        /// Type of key that failed (e.g., "request_private_key", "user_public_key")
        key_type: String,
        reason: String,
    },

    EncryptionFailed {
        operation: String,
        reason: String,
    },

    DecryptionFailed {
        operation: String,
        reason: String,
    },

    KeyDerivationFailed {
        operation: String,
        reason: String,
    },

    InvalidPayload {
        /// Which field failed validation
        field: String,
        reason: String,
    },

    Other(String),
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::InvalidSignature { operation, reason } => {
                write!(f, "Invalid signature during {}: {}", operation, reason)
            }
            CryptoError::InvalidKey { key_type, reason } => {
                write!(f, "Invalid key ({}): {}", key_type, reason)
            }
            CryptoError::EncryptionFailed { operation, reason } => {
                write!(f, "Encryption failed during {}: {}", operation, reason)
            }
            CryptoError::DecryptionFailed { operation, reason } => {
                write!(f, "Decryption failed during {}: {}", operation, reason)
            }
            CryptoError::KeyDerivationFailed { operation, reason } => {
                write!(f, "Key derivation failed during {}: {}", operation, reason)
            }
            CryptoError::InvalidPayload { field, reason } => {
                write!(f, "Invalid payload field '{}': {}", field, reason)
            }
            CryptoError::Other(msg) => {
                write!(f, "Crypto error: {}", msg)
            }
        }
    }
}

impl std::error::Error for CryptoError {}

impl From<anyhow::Error> for CryptoError {
    fn from(err: anyhow::Error) -> Self {
        CryptoError::Other(err.to_string())
    }
}

impl From<hex::FromHexError> for CryptoError {
    fn from(err: hex::FromHexError) -> Self {
        CryptoError::InvalidPayload {
            field: "hex_field".to_string(),
            reason: format!("hex decode error: {}", err),
        }
    }
}

impl From<k256::elliptic_curve::Error> for CryptoError {
    fn from(err: k256::elliptic_curve::Error) -> Self {
        CryptoError::InvalidKey {
            key_type: "secp256k1".to_string(),
            reason: format!("k256 error: {}", err),
        }
    }
}

impl From<ed25519_dalek::SignatureError> for CryptoError {
    fn from(err: ed25519_dalek::SignatureError) -> Self {
        CryptoError::InvalidSignature {
            operation: "eddsa".to_string(),
            reason: err.to_string(),
        }
    }
}
