// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use super::mock_backend::*;
use ethers::types::H256;
use fabstir_escrow::submission::decode_error;
use fabstir_escrow::{SubmissionError, TransactionSubmitter};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_failed_receipt_is_fatal() {
    let backend = Arc::new(MockBackend::new(vec![Plan::Mine(0)]));
    let submitter = TransactionSubmitter::new(backend.clone(), fast_config());

    assert_eq!(
        submitter.submit(call_to(1), None).await.unwrap_err(),
        SubmissionError::Reverted {
            tx_hash: H256::from_low_u64_be(1)
        }
    );
    assert_eq!(backend.sent().len(), 1);
}

#[tokio::test]
async fn test_non_transient_error_is_decoded_and_fatal() {
    let backend = Arc::new(MockBackend::new(vec![Plan::Reject(
        r#"(code: 3, message: execution reverted: secret should be empty, data: Some(String("0x")))"#
            .to_string(),
    )]));
    let submitter = TransactionSubmitter::new(backend.clone(), fast_config());

    match submitter.submit(call_to(1), None).await.unwrap_err() {
        SubmissionError::Fatal { message } => assert_eq!(message, "secret should be empty"),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(backend.sent().len(), 1);
}

#[tokio::test]
async fn test_earlier_transaction_landing_late_succeeds() {
    let backend = Arc::new(MockBackend::new(vec![
        Plan::MineAfter(1, Duration::from_millis(60)),
        Plan::Mine(0),
        Plan::Mine(0),
    ]));
    let submitter = TransactionSubmitter::new(backend.clone(), fast_config());

    let landed = submitter.submit(call_to(1), None).await.unwrap();
    assert_eq!(landed.receipt.transaction_hash, H256::from_low_u64_be(1));
    assert!(landed.attempts.len() >= 2);
}

#[tokio::test]
async fn test_hanging_send_stays_within_time_budget() {
    let backend = Arc::new(MockBackend::new(vec![Plan::Hang; 20]));
    let mut config = fast_config();
    config.max_elapsed_ms = 200;
    let submitter = TransactionSubmitter::new(backend.clone(), config);

    let outcome = tokio::time::timeout(
        Duration::from_secs(2),
        submitter.submit(call_to(1), None),
    )
    .await
    .expect("submission must give up on its own");
    match outcome.unwrap_err() {
        SubmissionError::TimeBudgetExceeded { last_error, .. } => {
            assert_eq!(last_error, "timed out sending transaction")
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(backend.sent().len() >= 2);
}

#[tokio::test]
async fn test_attempt_budget() {
    let backend = Arc::new(MockBackend::new(vec![]));
    let mut config = fast_config();
    config.max_attempts = 2;
    let submitter = TransactionSubmitter::new(backend.clone(), config);

    assert!(matches!(
        submitter.submit(call_to(1), None).await.unwrap_err(),
        SubmissionError::AttemptsExhausted { attempts: 2, .. }
    ));
    assert_eq!(backend.sent().len(), 2);
}

#[tokio::test]
async fn test_time_budget() {
    let backend = Arc::new(MockBackend::new(vec![]));
    let mut config = fast_config();
    config.max_elapsed_ms = 100;
    let submitter = TransactionSubmitter::new(backend.clone(), config);

    assert!(matches!(
        submitter.submit(call_to(1), None).await.unwrap_err(),
        SubmissionError::TimeBudgetExceeded { .. }
    ));
    assert!(backend.sent().len() >= 2);
}

#[tokio::test]
async fn test_cancellation_stops_waiting() {
    let backend = Arc::new(MockBackend::new(vec![]));
    let mut config = fast_config();
    config.attempt_timeout_ms = 10_000;
    let submitter = TransactionSubmitter::new(backend.clone(), config);
    let token = CancellationToken::new();

    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let err = submitter
        .submit_with_cancel(call_to(1), None, &token)
        .await
        .unwrap_err();
    assert_eq!(err, SubmissionError::Cancelled);
    assert_eq!(backend.sent().len(), 1);
}

#[test]
fn test_decode_falls_back_to_raw() {
    assert_eq!(decode_error("connection reset by peer"), "connection reset by peer");
}
