// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::support::*;
use fabstir_escrow::ledger::RetrievalOutcomeKind;
use fabstir_escrow::ServiceKind;

#[tokio::test]
async fn test_retrieval_waits_for_lock_time() {
    let (service, clock) = create_service();
    let user = addr(1);
    let provider = addr(10);
    service.deposit(user, wei(500)).await.unwrap();
    service
        .transfer_fund(user, provider, ServiceKind::Inference, wei(200))
        .await
        .unwrap();

    let report = service
        .retrieve_fund(user, &[provider], ServiceKind::Inference)
        .await
        .unwrap();
    assert_eq!(
        report.outcomes,
        vec![(
            provider,
            RetrievalOutcomeKind::Requested {
                amount: wei(200),
                unlock_at: START + LOCK_TIME
            }
        )]
    );
    let account = service
        .get_account(user, provider, ServiceKind::Inference)
        .await
        .unwrap();
    assert!(account.balance.is_zero());
    assert_eq!(account.pending_refund, wei(200));
    assert_balanced(&service).await;

    // Before unlock: no-op, timer not reset
    clock.advance(LOCK_TIME - 1);
    let report = service
        .retrieve_fund(user, &[provider], ServiceKind::Inference)
        .await
        .unwrap();
    assert_eq!(
        report.outcomes[0].1,
        RetrievalOutcomeKind::StillLocked {
            unlock_at: START + LOCK_TIME
        }
    );
    assert_eq!(report.ledger.available_balance, wei(300));

    clock.advance(1);
    let report = service
        .retrieve_fund(user, &[provider], ServiceKind::Inference)
        .await
        .unwrap();
    assert_eq!(report.outcomes[0].1, RetrievalOutcomeKind::Released(wei(200)));
    assert_eq!(report.ledger.available_balance, wei(500));
    assert_eq!(report.ledger.total_balance, wei(500));
    assert_balanced(&service).await;
}

#[tokio::test]
async fn test_transfer_cancels_pending_refund() {
    let (service, clock) = create_service();
    let user = addr(1);
    let provider = addr(10);
    service.deposit(user, wei(500)).await.unwrap();
    service
        .transfer_fund(user, provider, ServiceKind::FineTuning, wei(100))
        .await
        .unwrap();
    service
        .retrieve_fund(user, &[provider], ServiceKind::FineTuning)
        .await
        .unwrap();

    clock.advance(10);
    let outcome = service
        .transfer_fund(user, provider, ServiceKind::FineTuning, wei(1))
        .await
        .unwrap();
    assert_eq!(outcome.cancelled_refund, wei(100));
    assert_eq!(outcome.update.new_balance, wei(101));
    assert!(outcome.update.pending_refund.is_zero());

    // A later retrieval starts a fresh lock window
    clock.advance(LOCK_TIME * 2);
    let report = service
        .retrieve_fund(user, &[provider], ServiceKind::FineTuning)
        .await
        .unwrap();
    assert!(matches!(
        report.outcomes[0].1,
        RetrievalOutcomeKind::Requested { amount, .. } if amount == wei(101)
    ));
    assert_balanced(&service).await;
}

#[tokio::test]
async fn test_retrieval_across_providers_is_all_or_nothing() {
    let (service, _clock) = create_service();
    let user = addr(1);
    service.deposit(user, wei(500)).await.unwrap();
    service
        .transfer_fund(user, addr(10), ServiceKind::Inference, wei(100))
        .await
        .unwrap();

    assert!(service
        .retrieve_fund(user, &[addr(10), addr(11)], ServiceKind::Inference)
        .await
        .is_err());
    let account = service
        .get_account(user, addr(10), ServiceKind::Inference)
        .await
        .unwrap();
    assert_eq!(account.balance, wei(100));
    assert!(account.pending_refund.is_zero());
}

#[tokio::test]
async fn test_retrieval_of_other_kind_untouched() {
    let (service, _clock) = create_service();
    let user = addr(1);
    service.deposit(user, wei(500)).await.unwrap();
    service
        .transfer_fund(user, addr(10), ServiceKind::Inference, wei(100))
        .await
        .unwrap();
    service
        .transfer_fund(user, addr(10), ServiceKind::FineTuning, wei(100))
        .await
        .unwrap();

    service
        .retrieve_fund(user, &[addr(10)], ServiceKind::Inference)
        .await
        .unwrap();
    let fine_tuning = service
        .get_account(user, addr(10), ServiceKind::FineTuning)
        .await
        .unwrap();
    assert_eq!(fine_tuning.balance, wei(100));
    assert!(fine_tuning.pending_refund.is_zero());
}
