// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, U256};
use fabstir_escrow::crypto::sign_claim;
use fabstir_escrow::{EscrowConfig, EscrowService, FineTuningClaim, ManualClock, ProofVerifier};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const PENALTY: u8 = 30;

/// Verifier whose verdict the test controls
#[derive(Default)]
pub struct SwitchVerifier {
    reject: AtomicBool,
}

impl SwitchVerifier {
    pub fn reject(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }
}

impl ProofVerifier for SwitchVerifier {
    fn verify(&self, proof: &[u8], _public_inputs: &[U256]) -> bool {
        !self.reject.load(Ordering::SeqCst) && !proof.is_empty()
    }
}

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn wei(n: u64) -> U256 {
    U256::from(n)
}

pub fn create_service() -> (EscrowService, Arc<SwitchVerifier>, Arc<ManualClock>) {
    let config = EscrowConfig {
        owner: addr(0xad),
        lock_time_secs: 3600,
        penalty_percentage: PENALTY,
    };
    let verifier = Arc::new(SwitchVerifier::default());
    let clock = Arc::new(ManualClock::new(10_000));
    let service = EscrowService::with_clock(&config, verifier.clone(), clock.clone());
    (service, verifier, clock)
}

pub struct ProviderSigner {
    pub key: [u8; 32],
    pub address: Address,
}

impl ProviderSigner {
    pub fn new(byte: u8) -> Self {
        let key = [byte; 32];
        let address = LocalWallet::from_bytes(&key).unwrap().address();
        Self { key, address }
    }

    pub fn claim(
        &self,
        user: Address,
        index: u64,
        nonce: u64,
        fee: u64,
        root: &[u8],
        secret: &[u8],
    ) -> FineTuningClaim {
        let mut claim = FineTuningClaim {
            index,
            encrypted_secret: Bytes::from(secret.to_vec()),
            model_root_hash: Bytes::from(root.to_vec()),
            nonce: U256::from(nonce),
            provider_signer: self.address,
            signature: Bytes::new(),
            task_fee: U256::from(fee),
            user,
        };
        let signature = sign_claim(&self.key, &claim.digest()).unwrap();
        claim.signature = Bytes::from(signature.to_vec());
        claim
    }
}
