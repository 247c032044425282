// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request Record Layout
//!
//! ```text
//! offset  size  field
//! 0       8     nonce     (u64, little-endian)
//! 8       16    fee       (u128, little-endian)
//! 24      20    user      (address bytes)
//! 44      20    provider  (address bytes)
//! ```

use ethers::types::Address;
use serde::{Deserialize, Serialize};

pub const NONCE_SIZE: usize = 8;
pub const FEE_SIZE: usize = 16;
pub const ADDRESS_SIZE: usize = 20;
pub const REQUEST_RECORD_SIZE: usize = NONCE_SIZE + FEE_SIZE + 2 * ADDRESS_SIZE;

const FEE_OFFSET: usize = NONCE_SIZE;
const USER_OFFSET: usize = FEE_OFFSET + FEE_SIZE;
const PROVIDER_OFFSET: usize = USER_OFFSET + ADDRESS_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid record length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("Batch length {0} is not a multiple of {REQUEST_RECORD_SIZE}")]
    UnalignedBatch(usize),
}

/// One metered call, as authorised by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestRecord {
    pub nonce: u64,
    pub fee: u128,
    pub user: Address,
    pub provider: Address,
}

impl RequestRecord {
    pub fn new(nonce: u64, fee: u128, user: Address, provider: Address) -> Self {
        Self {
            nonce,
            fee,
            user,
            provider,
        }
    }

    pub fn to_bytes(&self) -> [u8; REQUEST_RECORD_SIZE] {
        let mut out = [0u8; REQUEST_RECORD_SIZE];
        out[..FEE_OFFSET].copy_from_slice(&self.nonce.to_le_bytes());
        out[FEE_OFFSET..USER_OFFSET].copy_from_slice(&self.fee.to_le_bytes());
        out[USER_OFFSET..PROVIDER_OFFSET].copy_from_slice(self.user.as_bytes());
        out[PROVIDER_OFFSET..].copy_from_slice(self.provider.as_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() != REQUEST_RECORD_SIZE {
            return Err(CodecError::InvalidLength {
                expected: REQUEST_RECORD_SIZE,
                actual: bytes.len(),
            });
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[..FEE_OFFSET]);
        let mut fee = [0u8; FEE_SIZE];
        fee.copy_from_slice(&bytes[FEE_OFFSET..USER_OFFSET]);

        Ok(Self {
            nonce: u64::from_le_bytes(nonce),
            fee: u128::from_le_bytes(fee),
            user: Address::from_slice(&bytes[USER_OFFSET..PROVIDER_OFFSET]),
            provider: Address::from_slice(&bytes[PROVIDER_OFFSET..]),
        })
    }

    /// Concatenate records in order, with no framing between them
    pub fn encode_batch(records: &[RequestRecord]) -> Vec<u8> {
        let mut out = Vec::with_capacity(records.len() * REQUEST_RECORD_SIZE);
        for record in records {
            out.extend_from_slice(&record.to_bytes());
        }
        out
    }

    pub fn decode_batch(bytes: &[u8]) -> Result<Vec<RequestRecord>, CodecError> {
        if bytes.len() % REQUEST_RECORD_SIZE != 0 {
            return Err(CodecError::UnalignedBatch(bytes.len()));
        }
        bytes
            .chunks_exact(REQUEST_RECORD_SIZE)
            .map(RequestRecord::from_bytes)
            .collect()
    }
}
