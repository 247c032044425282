// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{transaction::eip2718::TypedTransaction, TransactionReceipt, H256, U256, U64};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::backend::{BackendError, ChainBackend};
use super::errors::{decode_error, is_transient};
use super::gas::GasPolicy;
use super::types::{Attempt, SubmissionError, SubmissionReceipt};
use crate::config::SubmitterConfig;

enum State {
    Send {
        gas_price: U256,
        nonce: Option<U256>,
    },
    AwaitReceipt {
        tx_hash: H256,
        gas_price: U256,
        nonce: Option<U256>,
    },
    Timeout {
        gas_price: U256,
        nonce: Option<U256>,
    },
    Escalate {
        gas_price: U256,
        nonce: Option<U256>,
        cause: String,
    },
}

/// Result of watching every hash sent so far
enum ReceiptPoll {
    Landed(TransactionReceipt),
    /// Every sent transaction was mined and none succeeded
    AllReverted(H256),
}

/// Lands transactions for one signing identity. Submissions through the
/// same submitter run one at a time.
pub struct TransactionSubmitter<B: ChainBackend> {
    backend: Arc<B>,
    config: SubmitterConfig,
    identity_lock: Arc<Mutex<()>>,
}

impl<B: ChainBackend> Clone for TransactionSubmitter<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            config: self.config.clone(),
            identity_lock: self.identity_lock.clone(),
        }
    }
}

impl<B: ChainBackend> TransactionSubmitter<B> {
    pub fn new(backend: Arc<B>, config: SubmitterConfig) -> Self {
        Self {
            backend,
            config,
            identity_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn config(&self) -> &SubmitterConfig {
        &self.config
    }

    pub async fn submit(
        &self,
        call: TypedTransaction,
        max_gas_price: Option<U256>,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.submit_with_cancel(call, max_gas_price, &CancellationToken::new())
            .await
    }

    pub async fn submit_with_cancel(
        &self,
        call: TypedTransaction,
        max_gas_price: Option<U256>,
        cancel: &CancellationToken,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let _identity = tokio::select! {
            _ = cancel.cancelled() => return Err(SubmissionError::Cancelled),
            guard = self.identity_lock.lock() => guard,
        };

        let started = Instant::now();
        let policy = GasPolicy::new(
            self.config.gas_step_percent,
            max_gas_price.or(self.config.default_max_gas_price),
        );
        let mut last_error = String::from("no attempt made");
        let supplied = call.gas_price();
        let estimated = match supplied {
            Some(price) => price,
            None => self.estimate_gas_price(started, cancel, &mut last_error).await?,
        };

        let mut attempts: Vec<Attempt> = Vec::new();
        let mut reverted: Vec<H256> = Vec::new();
        let mut state = State::Send {
            gas_price: policy.starting_price(supplied, estimated),
            nonce: call.nonce().copied(),
        };

        loop {
            if cancel.is_cancelled() {
                warn!("Submission cancelled after {} attempts", attempts.len());
                return Err(SubmissionError::Cancelled);
            }
            self.check_time_budget(started, &last_error)?;

            state = match state {
                State::Send { gas_price, nonce } => {
                    if attempts.len() as u32 >= self.config.max_attempts {
                        error!(
                            "Submission gave up after {} attempts: {}",
                            attempts.len(),
                            last_error
                        );
                        return Err(SubmissionError::AttemptsExhausted {
                            attempts: attempts.len() as u32,
                            last_error,
                        });
                    }

                    let mut tx = call.clone();
                    tx.set_gas_price(gas_price);
                    if let Some(n) = nonce {
                        tx.set_nonce(n);
                    }
                    info!(
                        "Sending transaction (attempt {}, gas price {}, nonce {:?})",
                        attempts.len() + 1,
                        gas_price,
                        nonce
                    );

                    let sent = tokio::select! {
                        _ = cancel.cancelled() => return Err(SubmissionError::Cancelled),
                        sent = self.bounded(started, self.backend.send(tx)) => sent,
                    };
                    match sent {
                        Some(Ok(tx_hash)) => {
                            attempts.push(Attempt {
                                gas_price,
                                nonce,
                                tx_hash: Some(tx_hash),
                            });
                            State::AwaitReceipt {
                                tx_hash,
                                gas_price,
                                nonce,
                            }
                        }
                        Some(Err(e)) if is_transient(&e.0, &self.config.transient_errors) => {
                            attempts.push(Attempt {
                                gas_price,
                                nonce,
                                tx_hash: None,
                            });
                            warn!("Transient send error at gas price {}: {}", gas_price, e.0);
                            State::Escalate {
                                gas_price,
                                nonce,
                                cause: e.0,
                            }
                        }
                        Some(Err(e)) => {
                            let message = decode_error(&e.0);
                            error!("Transaction failed: {}", message);
                            return Err(SubmissionError::Fatal { message });
                        }
                        None => {
                            attempts.push(Attempt {
                                gas_price,
                                nonce,
                                tx_hash: None,
                            });
                            warn!("Send at gas price {} did not return in time", gas_price);
                            State::Escalate {
                                gas_price,
                                nonce,
                                cause: "timed out sending transaction".to_string(),
                            }
                        }
                    }
                }

                State::AwaitReceipt {
                    tx_hash,
                    gas_price,
                    nonce,
                } => {
                    // An earlier send may still land after its own deadline passed
                    let hashes: Vec<H256> = attempts.iter().filter_map(|a| a.tx_hash).collect();
                    let waited = tokio::select! {
                        _ = cancel.cancelled() => return Err(SubmissionError::Cancelled),
                        waited = tokio::time::timeout(
                            self.step_deadline(started),
                            self.poll_receipts(&hashes, &mut reverted),
                        ) => waited,
                    };
                    match waited {
                        Ok(Ok(ReceiptPoll::Landed(receipt))) => {
                            info!(
                                "Transaction {:?} confirmed after {} attempts",
                                receipt.transaction_hash,
                                attempts.len()
                            );
                            return Ok(SubmissionReceipt { receipt, attempts });
                        }
                        Ok(Ok(ReceiptPoll::AllReverted(hash))) => {
                            error!("Transaction {:?} reverted", hash);
                            return Err(SubmissionError::Reverted { tx_hash: hash });
                        }
                        Ok(Err(e)) if is_transient(&e.0, &self.config.transient_errors) => {
                            warn!("Transient receipt error for {:?}: {}", tx_hash, e.0);
                            State::Escalate {
                                gas_price,
                                nonce,
                                cause: e.0,
                            }
                        }
                        Ok(Err(e)) => {
                            let message = decode_error(&e.0);
                            error!("Receipt lookup for {:?} failed: {}", tx_hash, message);
                            return Err(SubmissionError::Fatal { message });
                        }
                        Err(_) => {
                            if let Some(hash) = reverted.last().copied() {
                                error!(
                                    "Transaction {:?} reverted and no other attempt landed",
                                    hash
                                );
                                return Err(SubmissionError::Reverted { tx_hash: hash });
                            }
                            warn!(
                                "No receipt for {:?} within {}ms",
                                tx_hash, self.config.attempt_timeout_ms
                            );
                            State::Timeout { gas_price, nonce }
                        }
                    }
                }

                State::Timeout { gas_price, nonce } => State::Escalate {
                    gas_price,
                    nonce: self.check_nonce_drift(started, nonce).await,
                    cause: "timed out waiting for receipt".to_string(),
                },

                State::Escalate {
                    gas_price,
                    nonce,
                    cause,
                } => {
                    last_error = cause;
                    match policy.escalate(gas_price) {
                        Some(next) => {
                            info!("Escalating gas price {} -> {}", gas_price, next);
                            State::Send {
                                gas_price: next,
                                nonce,
                            }
                        }
                        None => {
                            let cap = policy.cap().unwrap_or(gas_price);
                            error!("Gas price cap {} reached: {}", cap, last_error);
                            return Err(SubmissionError::GasPriceCapReached { cap, last_error });
                        }
                    }
                }
            };
        }
    }

    fn check_time_budget(&self, started: Instant, last_error: &str) -> Result<(), SubmissionError> {
        if started.elapsed() >= self.config.max_elapsed() {
            error!(
                "Submission gave up after {}ms: {}",
                started.elapsed().as_millis(),
                last_error
            );
            return Err(SubmissionError::TimeBudgetExceeded {
                elapsed_ms: started.elapsed().as_millis(),
                last_error: last_error.to_string(),
            });
        }
        Ok(())
    }

    /// Per-step deadline: the attempt timeout, never past the overall budget
    fn step_deadline(&self, started: Instant) -> Duration {
        let remaining = self.config.max_elapsed().saturating_sub(started.elapsed());
        self.config.attempt_timeout().min(remaining)
    }

    /// Runs one backend call under the step deadline; `None` when it ran out
    async fn bounded<T, F>(&self, started: Instant, call: F) -> Option<Result<T, BackendError>>
    where
        F: Future<Output = Result<T, BackendError>>,
    {
        tokio::time::timeout(self.step_deadline(started), call)
            .await
            .ok()
    }

    async fn estimate_gas_price(
        &self,
        started: Instant,
        cancel: &CancellationToken,
        last_error: &mut String,
    ) -> Result<U256, SubmissionError> {
        loop {
            self.check_time_budget(started, last_error)?;
            let estimated = tokio::select! {
                _ = cancel.cancelled() => return Err(SubmissionError::Cancelled),
                estimated = self.bounded(started, self.backend.gas_price()) => estimated,
            };
            match estimated {
                Some(Ok(price)) => return Ok(price),
                Some(Err(e)) if is_transient(&e.0, &self.config.transient_errors) => {
                    warn!("Transient gas price error: {}", e.0);
                    *last_error = e.0;
                }
                Some(Err(e)) => return Err(SubmissionError::Provider(decode_error(&e.0))),
                None => {
                    warn!("Gas price request did not return in time");
                    *last_error = "timed out estimating gas price".to_string();
                }
            }
        }
    }

    /// Watches every sent hash until one succeeds or all have reverted.
    /// Reverted hashes are recorded in `reverted` as they are seen.
    async fn poll_receipts(
        &self,
        hashes: &[H256],
        reverted: &mut Vec<H256>,
    ) -> Result<ReceiptPoll, BackendError> {
        loop {
            for hash in hashes {
                if reverted.contains(hash) {
                    continue;
                }
                if let Some(receipt) = self.backend.receipt(*hash).await? {
                    if receipt.status == Some(U64::from(1)) {
                        return Ok(ReceiptPoll::Landed(receipt));
                    }
                    warn!("Transaction {:?} mined with failed status", hash);
                    reverted.push(*hash);
                }
            }
            if !hashes.is_empty() && reverted.len() >= hashes.len() {
                if let Some(last) = reverted.last() {
                    return Ok(ReceiptPoll::AllReverted(*last));
                }
            }
            tokio::time::sleep(self.config.receipt_poll_interval()).await;
        }
    }

    /// Too many unconfirmed transactions: pin the next send to the
    /// confirmed nonce so it replaces the oldest stuck one.
    async fn check_nonce_drift(&self, started: Instant, current: Option<U256>) -> Option<U256> {
        match self.bounded(started, self.backend.nonces()).await {
            Some(Ok(status)) if status.drift() > U256::from(self.config.nonce_drift_threshold) => {
                warn!(
                    "Nonce drift {} (confirmed {}, pending {}); reusing confirmed nonce",
                    status.drift(),
                    status.confirmed,
                    status.pending
                );
                Some(status.confirmed)
            }
            Some(Ok(status)) => {
                debug!("Nonce drift {} within threshold", status.drift());
                current
            }
            Some(Err(e)) => {
                warn!("Nonce check failed: {}", e.0);
                current
            }
            None => {
                warn!("Nonce check did not return in time");
                current
            }
        }
    }
}
