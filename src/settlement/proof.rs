// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Public inputs of a batched inference proof
//!
//! Each chunk occupies seven consecutive words:
//!
//! | word | meaning |
//! |------|---------|
//! | 0 | user address |
//! | 1 | provider address |
//! | 2 | first nonce in the chunk |
//! | 3 | last nonce in the chunk |
//! | 4 | total fee of the chunk |
//! | 5, 6 | user request-signing key |

use ethers::types::{Address, U256};

use crate::crypto::PackedKey;
use crate::error::{EscrowError, Result};

pub const CHUNK_WORDS: usize = 7;

/// Checks a proof against its public inputs. The proof system itself is opaque.
pub trait ProofVerifier: Send + Sync {
    fn verify(&self, proof: &[u8], public_inputs: &[U256]) -> bool;
}

impl<F> ProofVerifier for F
where
    F: Fn(&[u8], &[U256]) -> bool + Send + Sync,
{
    fn verify(&self, proof: &[u8], public_inputs: &[U256]) -> bool {
        self(proof, public_inputs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofChunk {
    pub user: Address,
    pub provider: Address,
    pub first_nonce: U256,
    pub last_nonce: U256,
    pub total_fee: U256,
    pub signer_key: PackedKey,
}

impl ProofChunk {
    pub fn to_words(&self) -> [U256; CHUNK_WORDS] {
        [
            address_word(self.user),
            address_word(self.provider),
            self.first_nonce,
            self.last_nonce,
            self.total_fee,
            self.signer_key.0[0],
            self.signer_key.0[1],
        ]
    }
}

pub fn address_word(address: Address) -> U256 {
    U256::from_big_endian(address.as_bytes())
}

fn word_address(word: U256, field: &str) -> Result<Address> {
    if word.bits() > 160 {
        return Err(EscrowError::MalformedClaim(format!(
            "{} word does not fit an address",
            field
        )));
    }
    let mut bytes = [0u8; 32];
    word.to_big_endian(&mut bytes);
    Ok(Address::from_slice(&bytes[12..]))
}

/// Splits flat public inputs into chunks, checking the declared shape
pub fn decode_chunks(public_inputs: &[U256], num_chunks: usize) -> Result<Vec<ProofChunk>> {
    let expected = num_chunks
        .checked_mul(CHUNK_WORDS)
        .ok_or_else(|| EscrowError::MalformedClaim("chunk count overflows".to_string()))?;
    if public_inputs.len() != expected {
        return Err(EscrowError::MalformedClaim(format!(
            "expected {} public input words for {} chunks, got {}",
            expected,
            num_chunks,
            public_inputs.len()
        )));
    }

    public_inputs
        .chunks_exact(CHUNK_WORDS)
        .map(|w| {
            Ok(ProofChunk {
                user: word_address(w[0], "user")?,
                provider: word_address(w[1], "provider")?,
                first_nonce: w[2],
                last_nonce: w[3],
                total_fee: w[4],
                signer_key: PackedKey([w[5], w[6]]),
            })
        })
        .collect()
}
