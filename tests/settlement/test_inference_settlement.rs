// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::support::*;
use ethers::types::{Address, Bytes, U256};
use fabstir_escrow::crypto::{keypair_from_seed, PackedKey};
use fabstir_escrow::settlement::ProofChunk;
use fabstir_escrow::{EscrowError, EscrowEvent, EscrowService, InferenceClaim, ServiceKind};

const PROVIDER: u64 = 60;

struct User {
    address: Address,
    key: PackedKey,
}

async fn register(service: &EscrowService, n: u64, committed: u64) -> User {
    let keys = keypair_from_seed(&[n as u8; 32]);
    let address = addr(n);
    service
        .add_ledger(address, keys.public_key, String::new(), wei(1000))
        .await
        .unwrap();
    service
        .transfer_fund(address, addr(PROVIDER), ServiceKind::Inference, wei(committed))
        .await
        .unwrap();
    User {
        address,
        key: keys.public_key,
    }
}

fn chunk(user: &User, first: u64, last: u64, fee: u64) -> ProofChunk {
    ProofChunk {
        user: user.address,
        provider: addr(PROVIDER),
        first_nonce: U256::from(first),
        last_nonce: U256::from(last),
        total_fee: U256::from(fee),
        signer_key: user.key,
    }
}

fn claim(segments: &[Vec<ProofChunk>]) -> InferenceClaim {
    let public_inputs: Vec<U256> = segments
        .iter()
        .flatten()
        .flat_map(|c| c.to_words())
        .collect();
    InferenceClaim {
        proof: Bytes::from(vec![1u8; 8]),
        num_chunks: segments.iter().map(|s| s.len()).sum(),
        segment_size: segments.iter().map(|s| s.len()).collect(),
        public_inputs,
    }
}

async fn balance(service: &EscrowService, user: &User) -> U256 {
    service
        .get_account(user.address, addr(PROVIDER), ServiceKind::Inference)
        .await
        .unwrap()
        .balance
}

#[tokio::test]
async fn test_batch_settles_every_user() {
    let (service, _verifier, _clock) = create_service();
    let alice = register(&service, 1, 500).await;
    let bob = register(&service, 2, 300).await;
    let mut events = service.subscribe_to_events().await;

    let batch = claim(&[
        vec![chunk(&alice, 1, 4, 40), chunk(&alice, 5, 9, 50)],
        vec![chunk(&bob, 1, 2, 20)],
    ]);
    let outcome = service
        .settle_inference_fees(addr(PROVIDER), batch)
        .await
        .unwrap();
    assert_eq!(outcome.charged, wei(110));
    assert_eq!(outcome.updates.len(), 2);

    assert_eq!(balance(&service, &alice).await, wei(410));
    assert_eq!(balance(&service, &bob).await, wei(280));
    let account = service
        .get_account(alice.address, addr(PROVIDER), ServiceKind::Inference)
        .await
        .unwrap();
    assert_eq!(account.nonce, U256::from(9));

    for expected in [alice.address, bob.address] {
        match events.recv().await.unwrap() {
            EscrowEvent::BalanceUpdated(update) => assert_eq!(update.user, expected),
            other => panic!("unexpected event {:?}", other),
        }
    }
    assert_eq!(service.provider_earnings(addr(PROVIDER)).await, wei(110));

    let state = service.snapshot().await;
    assert!(state.ledger_balanced(alice.address));
    assert!(state.ledger_balanced(bob.address));
}

#[tokio::test]
async fn test_replayed_nonce_rejects_whole_batch() {
    let (service, _verifier, _clock) = create_service();
    let alice = register(&service, 1, 500).await;
    let bob = register(&service, 2, 300).await;

    service
        .settle_inference_fees(addr(PROVIDER), claim(&[vec![chunk(&alice, 1, 4, 40)]]))
        .await
        .unwrap();

    let replay = claim(&[
        vec![chunk(&bob, 1, 2, 20)],
        vec![chunk(&alice, 4, 6, 10)],
    ]);
    assert!(matches!(
        service.settle_inference_fees(addr(PROVIDER), replay).await,
        Err(EscrowError::NonceConsumed { .. })
    ));
    assert_eq!(balance(&service, &bob).await, wei(300));
    assert_eq!(balance(&service, &alice).await, wei(460));
}

#[tokio::test]
async fn test_insufficient_balance_rejects_whole_batch() {
    let (service, _verifier, _clock) = create_service();
    let alice = register(&service, 1, 500).await;
    let bob = register(&service, 2, 30).await;

    let batch = claim(&[
        vec![chunk(&alice, 1, 4, 40)],
        vec![chunk(&bob, 1, 2, 31)],
    ]);
    assert!(matches!(
        service.settle_inference_fees(addr(PROVIDER), batch).await,
        Err(EscrowError::InsufficientBalance { .. })
    ));
    assert_eq!(balance(&service, &alice).await, wei(500));
    assert!(service.provider_earnings(addr(PROVIDER)).await.is_zero());
}

#[tokio::test]
async fn test_provider_and_signer_must_match() {
    let (service, _verifier, _clock) = create_service();
    let alice = register(&service, 1, 500).await;

    let mut foreign = chunk(&alice, 1, 2, 5);
    foreign.provider = addr(61);
    assert!(matches!(
        service
            .settle_inference_fees(addr(PROVIDER), claim(&[vec![foreign]]))
            .await,
        Err(EscrowError::Unauthorized(_))
    ));

    let mut wrong_key = chunk(&alice, 1, 2, 5);
    wrong_key.signer_key = keypair_from_seed(&[99u8; 32]).public_key;
    assert!(matches!(
        service
            .settle_inference_fees(addr(PROVIDER), claim(&[vec![wrong_key]]))
            .await,
        Err(EscrowError::InvalidSignature(_))
    ));
}

#[tokio::test]
async fn test_fee_overflow_rejected() {
    let (service, _verifier, _clock) = create_service();
    let alice = register(&service, 1, 500).await;

    let mut first = chunk(&alice, 1, 2, 0);
    first.total_fee = U256::MAX;
    let mut second = chunk(&alice, 3, 4, 0);
    second.total_fee = U256::from(1);
    assert_eq!(
        service
            .settle_inference_fees(addr(PROVIDER), claim(&[vec![first, second]]))
            .await,
        Err(EscrowError::FeeOverflow)
    );
}

#[tokio::test]
async fn test_rejected_proof_changes_nothing() {
    let (service, verifier, _clock) = create_service();
    let alice = register(&service, 1, 500).await;
    verifier.reject();

    assert!(matches!(
        service
            .settle_inference_fees(addr(PROVIDER), claim(&[vec![chunk(&alice, 1, 2, 5)]]))
            .await,
        Err(EscrowError::InvalidProof(_))
    ));
    assert_eq!(balance(&service, &alice).await, wei(500));
}

#[tokio::test]
async fn test_malformed_shapes_rejected() {
    let (service, _verifier, _clock) = create_service();
    let alice = register(&service, 1, 500).await;

    let mut bad_segments = claim(&[vec![chunk(&alice, 1, 2, 5), chunk(&alice, 3, 4, 5)]]);
    bad_segments.segment_size = vec![1];
    assert!(matches!(
        service.settle_inference_fees(addr(PROVIDER), bad_segments).await,
        Err(EscrowError::MalformedClaim(_))
    ));

    let mut short_inputs = claim(&[vec![chunk(&alice, 1, 2, 5)]]);
    short_inputs.public_inputs.pop();
    assert!(matches!(
        service.settle_inference_fees(addr(PROVIDER), short_inputs).await,
        Err(EscrowError::MalformedClaim(_))
    ));

    let inverted = claim(&[vec![chunk(&alice, 5, 2, 5)]]);
    assert!(matches!(
        service.settle_inference_fees(addr(PROVIDER), inverted).await,
        Err(EscrowError::MalformedClaim(_))
    ));
}

#[tokio::test]
async fn test_provider_signer_acknowledgement_is_versioned() {
    let (service, _verifier, _clock) = create_service();
    let alice = register(&service, 1, 500).await;
    let tee_key = keypair_from_seed(&[5u8; 32]).public_key;

    let first = service
        .acknowledge_inference_signer(alice.address, addr(PROVIDER), tee_key)
        .await
        .unwrap();
    let second = service
        .acknowledge_inference_signer(alice.address, addr(PROVIDER), alice.key)
        .await
        .unwrap();
    assert_eq!(first.version, 1);
    assert_eq!(second.version, 2);
    assert_eq!(second.signer, alice.key);
}
