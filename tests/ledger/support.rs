// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{Address, U256};
use fabstir_escrow::{EscrowConfig, EscrowService, ManualClock, ProofVerifier};
use std::sync::Arc;

pub const LOCK_TIME: u64 = 100;
pub const START: u64 = 1_000;

pub struct AcceptAll;

impl ProofVerifier for AcceptAll {
    fn verify(&self, _proof: &[u8], _public_inputs: &[U256]) -> bool {
        true
    }
}

pub fn addr(n: u64) -> Address {
    Address::from_low_u64_be(n)
}

pub fn owner() -> Address {
    addr(0xad)
}

pub fn wei(n: u64) -> U256 {
    U256::from(n)
}

pub fn create_service() -> (EscrowService, Arc<ManualClock>) {
    let config = EscrowConfig {
        owner: owner(),
        lock_time_secs: LOCK_TIME,
        penalty_percentage: 30,
    };
    let clock = Arc::new(ManualClock::new(START));
    let service = EscrowService::with_clock(&config, Arc::new(AcceptAll), clock.clone());
    (service, clock)
}

/// Ledger invariant for every user in the snapshot
pub async fn assert_balanced(service: &EscrowService) {
    let state = service.snapshot().await;
    for ledger in state.all_ledgers() {
        assert!(
            state.ledger_balanced(ledger.user),
            "ledger of {:?} out of balance",
            ledger.user
        );
    }
}
