// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::support::*;
use ethers::types::{Address, Bytes};
use fabstir_escrow::crypto::{open_secret, seal_secret};
use fabstir_escrow::{EscrowError, EscrowEvent, EscrowService, ServiceKind};

const ROOT: &[u8] = b"model-root-hash";

struct Setup {
    service: EscrowService,
    user: Address,
    provider: Address,
    signer: ProviderSigner,
}

/// 1000 deposited, 250 committed to the provider, signer acknowledged,
/// one deliverable at index 0
async fn setup(acknowledge: bool) -> Setup {
    let (service, _verifier, _clock) = create_service();
    let user = addr(1);
    let provider = addr(50);
    let signer = ProviderSigner::new(0x42);

    service.deposit(user, wei(1000)).await.unwrap();
    service
        .transfer_fund(user, provider, ServiceKind::FineTuning, wei(250))
        .await
        .unwrap();
    service
        .acknowledge_fine_tuning_signer(user, provider, signer.address)
        .await
        .unwrap();
    let index = service
        .add_deliverable(provider, user, Bytes::from(ROOT.to_vec()))
        .await
        .unwrap();
    assert_eq!(index, 0);
    if acknowledge {
        service.acknowledge_deliverable(user, provider, 0).await.unwrap();
    }
    Setup {
        service,
        user,
        provider,
        signer,
    }
}

#[tokio::test]
async fn test_acknowledged_deliverable_pays_full_fee() {
    let s = setup(true).await;
    let mut events = s.service.subscribe_to_events().await;
    let claim = s.signer.claim(s.user, 0, 1, 10, ROOT, b"sealed-secret");

    let outcome = s
        .service
        .settle_fine_tuning_fees(s.provider, claim)
        .await
        .unwrap();
    assert_eq!(outcome.charged, wei(10));

    let account = s
        .service
        .get_account(s.user, s.provider, ServiceKind::FineTuning)
        .await
        .unwrap();
    assert_eq!(account.balance, wei(240));
    assert!(account.pending_refund.is_zero());

    match events.recv().await.unwrap() {
        EscrowEvent::BalanceUpdated(update) => {
            assert_eq!(update.new_balance, wei(240));
            assert!(update.pending_refund.is_zero());
        }
        other => panic!("unexpected event {:?}", other),
    }

    let ledger = s.service.get_ledger(s.user).await.unwrap();
    assert_eq!(ledger.total_balance, wei(990));
    assert_eq!(s.service.provider_earnings(s.provider).await, wei(10));

    let deliverable = s.service.get_deliverable(s.user, s.provider, 0).await.unwrap();
    assert!(deliverable.settled);
    assert_eq!(
        deliverable.encrypted_secret,
        Some(Bytes::from(b"sealed-secret".to_vec()))
    );
    let state = s.service.snapshot().await;
    assert!(state.ledger_balanced(s.user));
}

#[tokio::test]
async fn test_unacknowledged_deliverable_pays_penalty() {
    let s = setup(false).await;
    let claim = s.signer.claim(s.user, 0, 1, 10, ROOT, b"");

    let outcome = s
        .service
        .settle_fine_tuning_fees(s.provider, claim)
        .await
        .unwrap();
    assert_eq!(outcome.charged, wei(3));
    assert_eq!(outcome.updates[0].new_balance, wei(247));

    let deliverable = s.service.get_deliverable(s.user, s.provider, 0).await.unwrap();
    assert!(deliverable.settled);
    assert!(deliverable.encrypted_secret.is_none());
}

#[tokio::test]
async fn test_branch_table_rejects_mismatched_secret() {
    let s = setup(true).await;
    let claim = s.signer.claim(s.user, 0, 1, 10, ROOT, b"");
    let err = s
        .service
        .settle_fine_tuning_fees(s.provider, claim)
        .await
        .unwrap_err();
    assert_eq!(err, EscrowError::SecretRequired);
    assert_eq!(err.to_string(), "secret should not be empty");

    let s = setup(false).await;
    let claim = s.signer.claim(s.user, 0, 1, 10, ROOT, b"secret");
    let err = s
        .service
        .settle_fine_tuning_fees(s.provider, claim)
        .await
        .unwrap_err();
    assert_eq!(err, EscrowError::SecretNotAllowed);
    assert_eq!(err.to_string(), "secret should be empty");

    let account = s
        .service
        .get_account(s.user, s.provider, ServiceKind::FineTuning)
        .await
        .unwrap();
    assert_eq!(account.balance, wei(250));
    assert!(account.nonce.is_zero());
}

#[tokio::test]
async fn test_replay_is_rejected() {
    let s = setup(true).await;
    let claim = s.signer.claim(s.user, 0, 1, 10, ROOT, b"secret");
    s.service
        .settle_fine_tuning_fees(s.provider, claim.clone())
        .await
        .unwrap();

    assert!(matches!(
        s.service.settle_fine_tuning_fees(s.provider, claim).await,
        Err(EscrowError::NonceConsumed { .. })
    ));

    // Fresh nonce, same deliverable
    let again = s.signer.claim(s.user, 0, 2, 10, ROOT, b"secret");
    assert_eq!(
        s.service.settle_fine_tuning_fees(s.provider, again).await,
        Err(EscrowError::DeliverableSettled(0))
    );

    let account = s
        .service
        .get_account(s.user, s.provider, ServiceKind::FineTuning)
        .await
        .unwrap();
    assert_eq!(account.balance, wei(240));
}

#[tokio::test]
async fn test_fee_above_balance_rejected() {
    let s = setup(true).await;
    let claim = s.signer.claim(s.user, 0, 1, 251, ROOT, b"secret");
    assert_eq!(
        s.service.settle_fine_tuning_fees(s.provider, claim).await,
        Err(EscrowError::InsufficientBalance {
            required: wei(251),
            available: wei(250)
        })
    );
}

#[tokio::test]
async fn test_signature_and_signer_checks() {
    let s = setup(true).await;

    // Signed by a key the user never acknowledged
    let stranger = ProviderSigner::new(0x77);
    let claim = stranger.claim(s.user, 0, 1, 10, ROOT, b"secret");
    assert!(matches!(
        s.service.settle_fine_tuning_fees(s.provider, claim).await,
        Err(EscrowError::SignerNotAcknowledged { .. })
    ));

    // Claims the acknowledged signer but signed by someone else
    let mut forged = stranger.claim(s.user, 0, 1, 10, ROOT, b"secret");
    forged.provider_signer = s.signer.address;
    assert!(matches!(
        s.service.settle_fine_tuning_fees(s.provider, forged).await,
        Err(EscrowError::InvalidSignature(_))
    ));

    // Tampered fee invalidates the signature
    let mut tampered = s.signer.claim(s.user, 0, 1, 10, ROOT, b"secret");
    tampered.task_fee = wei(20);
    assert!(matches!(
        s.service.settle_fine_tuning_fees(s.provider, tampered).await,
        Err(EscrowError::InvalidSignature(_))
    ));

    // Wrong root hash
    let wrong_root = s.signer.claim(s.user, 0, 1, 10, b"other-root", b"secret");
    assert_eq!(
        s.service.settle_fine_tuning_fees(s.provider, wrong_root).await,
        Err(EscrowError::ModelRootHashMismatch(0))
    );
}

#[tokio::test]
async fn test_reacknowledged_signer_replaces_previous() {
    let s = setup(true).await;
    let rotated = ProviderSigner::new(0x43);
    let entry = s
        .service
        .acknowledge_fine_tuning_signer(s.user, s.provider, rotated.address)
        .await
        .unwrap();
    assert_eq!(entry.version, 2);

    let stale = s.signer.claim(s.user, 0, 1, 10, ROOT, b"secret");
    assert!(matches!(
        s.service.settle_fine_tuning_fees(s.provider, stale).await,
        Err(EscrowError::SignerNotAcknowledged { .. })
    ));
    let fresh = rotated.claim(s.user, 0, 1, 10, ROOT, b"secret");
    s.service
        .settle_fine_tuning_fees(s.provider, fresh)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_only_ledger_owner_acknowledges() {
    let s = setup(false).await;

    // A caller without a ledger cannot acknowledge anything
    assert_eq!(
        s.service.acknowledge_deliverable(addr(2), s.provider, 0).await,
        Err(EscrowError::LedgerNotFound(addr(2)))
    );
    // A caller with a ledger only reaches its own deliverables
    s.service.deposit(addr(2), wei(1)).await.unwrap();
    assert!(matches!(
        s.service.acknowledge_deliverable(addr(2), s.provider, 0).await,
        Err(EscrowError::DeliverableNotFound { .. })
    ));
    assert!(
        !s.service
            .get_deliverable(s.user, s.provider, 0)
            .await
            .unwrap()
            .acknowledged
    );

    s.service.acknowledge_deliverable(s.user, s.provider, 0).await.unwrap();
    assert_eq!(
        s.service.acknowledge_deliverable(s.user, s.provider, 0).await,
        Err(EscrowError::DeliverableAcknowledged(0))
    );
}

#[tokio::test]
async fn test_settlement_draws_from_locked_pending_refund() {
    let s = setup(true).await;
    s.service
        .retrieve_fund(s.user, &[s.provider], ServiceKind::FineTuning)
        .await
        .unwrap();

    let claim = s.signer.claim(s.user, 0, 1, 10, ROOT, b"secret");
    let outcome = s
        .service
        .settle_fine_tuning_fees(s.provider, claim)
        .await
        .unwrap();
    assert!(outcome.updates[0].new_balance.is_zero());
    assert_eq!(outcome.updates[0].pending_refund, wei(240));
    assert!(s.service.snapshot().await.ledger_balanced(s.user));
}

#[tokio::test]
async fn test_sealed_secret_reaches_user() {
    let s = setup(true).await;
    let user_key = k256::SecretKey::from_slice(&[9u8; 32]).unwrap();
    let user_public = user_key.public_key().to_sec1_bytes();
    let sealed = seal_secret(&user_public, b"model-key").unwrap();

    let claim = s.signer.claim(s.user, 0, 1, 10, ROOT, &sealed);
    s.service
        .settle_fine_tuning_fees(s.provider, claim)
        .await
        .unwrap();

    let stored = s
        .service
        .get_deliverable(s.user, s.provider, 0)
        .await
        .unwrap()
        .encrypted_secret
        .unwrap();
    let opened = open_secret(&user_key.to_bytes(), &stored).unwrap();
    assert_eq!(opened, b"model-key");
}
