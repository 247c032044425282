// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Cryptography for metered usage and settlement
//!
//! - **Request signing**: EdDSA keys the SDK uses to authorise metered calls
//! - **Claim signatures**: ECDSA signatures providers attach to fine-tuning claims
//! - **Secret sealing**: ECDH + XChaCha20-Poly1305 for the model key handed to the user
//! - **Model cipher**: AES-256-GCM for the fine-tuned artifact itself

pub mod claim_signature;
pub mod error;
pub mod model_cipher;
pub mod request_signer;
pub mod secret;
pub mod signature;

pub use claim_signature::{recover_claim_signer, sign_claim, ClaimDigest};
pub use error::CryptoError;
pub use model_cipher::{decrypt_model, encrypt_model, generate_model_key};
pub use request_signer::{
    generate_keypair, keypair_from_seed, sign_request, sign_requests, verify_request, PackedKey,
    PackedSignature, RequestKeyPair,
};
pub use secret::{derive_shared_key, open_secret, seal_secret};
pub use signature::{address_of, recover_signer};
