// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{Address, U256};

use crate::types::ServiceKind;

/// Errors raised by ledger and settlement operations
///
/// Every variant is a precondition failure: the operation that raised it
/// left no trace in the escrow state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EscrowError {
    #[error("Ledger does not exist for {0:?}")]
    LedgerNotFound(Address),

    #[error("Ledger already exists for {0:?}")]
    LedgerExists(Address),

    #[error("Account does not exist: user {user:?}, provider {provider:?}, {kind}")]
    AccountNotFound {
        user: Address,
        provider: Address,
        kind: ServiceKind,
    },

    #[error("Service does not exist: provider {provider:?}, {kind}")]
    ServiceNotFound { provider: Address, kind: ServiceKind },

    #[error("Deliverable {index} does not exist for user {user:?}, provider {provider:?}")]
    DeliverableNotFound {
        user: Address,
        provider: Address,
        index: u64,
    },

    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: U256, available: U256 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Nonce already used: {nonce} is not above {current}")]
    NonceConsumed { nonce: U256, current: U256 },

    #[error("Deliverable {0} already settled")]
    DeliverableSettled(u64),

    #[error("Deliverable {0} already acknowledged")]
    DeliverableAcknowledged(u64),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Provider signer not acknowledged by user {user:?} for provider {provider:?}")]
    SignerNotAcknowledged { user: Address, provider: Address },

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Model root hash does not match deliverable {0}")]
    ModelRootHashMismatch(u64),

    #[error("secret should not be empty")]
    SecretRequired,

    #[error("secret should be empty")]
    SecretNotAllowed,

    #[error("Malformed claim: {0}")]
    MalformedClaim(String),

    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    #[error("Fee total overflows")]
    FeeOverflow,

    #[error("Invalid penalty percentage: {0}")]
    InvalidPenaltyPercentage(u8),

    #[error("Invalid service descriptor: {0}")]
    InvalidService(String),
}

pub type Result<T> = std::result::Result<T, EscrowError>;
