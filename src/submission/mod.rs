// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Resilient transaction submission
//!
//! Sends a contract call and keeps it moving until it lands: receipts are
//! awaited under a hard deadline, stuck transactions are re-sent at a higher
//! gas price, and runaway nonces are pulled back to the confirmed nonce.

pub mod backend;
pub mod engine;
pub mod errors;
pub mod gas;
pub mod types;

pub use backend::{BackendError, ChainBackend, EthersBackend, NonceStatus};
pub use engine::TransactionSubmitter;
pub use errors::{decode_error, is_transient};
pub use gas::GasPolicy;
pub use types::{Attempt, SubmissionError, SubmissionReceipt};
