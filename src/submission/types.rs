// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{TransactionReceipt, H256, U256};

/// One send of the transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub gas_price: U256,
    pub nonce: Option<U256>,
    pub tx_hash: Option<H256>,
}

#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub receipt: TransactionReceipt,
    pub attempts: Vec<Attempt>,
}

impl SubmissionReceipt {
    pub fn final_gas_price(&self) -> Option<U256> {
        self.attempts.last().map(|a| a.gas_price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Transaction failed: {message}")]
    Fatal { message: String },

    #[error("Transaction {tx_hash:?} reverted")]
    Reverted { tx_hash: H256 },

    #[error("Gas price cap {cap} reached: {last_error}")]
    GasPriceCapReached { cap: U256, last_error: String },

    #[error("Gave up after {attempts} attempts: {last_error}")]
    AttemptsExhausted { attempts: u32, last_error: String },

    #[error("Gave up after {elapsed_ms}ms: {last_error}")]
    TimeBudgetExceeded { elapsed_ms: u128, last_error: String },

    #[error("Submission cancelled")]
    Cancelled,

    #[error("Provider error: {0}")]
    Provider(String),
}
