// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, U256};
use fabstir_escrow::crypto::{
    decrypt_model, encrypt_model, generate_model_key, open_secret, recover_claim_signer,
    seal_secret, sign_claim, ClaimDigest,
};

#[test]
fn test_model_key_travels_sealed_to_user() {
    let user = k256::SecretKey::from_slice(&[3u8; 32]).unwrap();
    let user_public = user.public_key().to_sec1_bytes();

    let model_key = generate_model_key();
    let artifact = b"lora adapter weights".to_vec();
    let encrypted_model = encrypt_model(&artifact, &model_key).unwrap();
    let sealed = seal_secret(&user_public, &model_key).unwrap();

    let recovered_key = open_secret(&user.to_bytes(), &sealed).unwrap();
    assert_eq!(recovered_key, model_key.to_vec());
    assert_eq!(decrypt_model(&encrypted_model, &recovered_key).unwrap(), artifact);
}

#[test]
fn test_sealed_secret_rejects_other_key() {
    let user = k256::SecretKey::from_slice(&[3u8; 32]).unwrap();
    let other = k256::SecretKey::from_slice(&[4u8; 32]).unwrap();
    let sealed = seal_secret(&user.public_key().to_sec1_bytes(), b"secret").unwrap();
    assert!(open_secret(&other.to_bytes(), &sealed).is_err());
}

#[test]
fn test_claim_signature_recovers_provider_signer() {
    let key = [0x42u8; 32];
    let signer = LocalWallet::from_bytes(&key).unwrap().address();
    let digest = ClaimDigest {
        encrypted_secret: b"sealed",
        model_root_hash: b"root",
        nonce: U256::from(1),
        provider_signer: signer,
        task_fee: U256::from(10),
        user: Address::repeat_byte(0x01),
    };

    let signature = sign_claim(&key, &digest).unwrap();
    assert_eq!(recover_claim_signer(&signature, &digest).unwrap(), signer);

    let altered = ClaimDigest {
        task_fee: U256::from(11),
        ..digest
    };
    assert_ne!(recover_claim_signer(&signature, &altered).unwrap(), signer);
}
