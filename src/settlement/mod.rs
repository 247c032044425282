// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Fee settlement
//!
//! Two claim flavours debit user accounts in favour of a provider:
//! fine-tuning claims gated on deliverable acknowledgement, and batched
//! inference claims gated on an opaque proof over request chunks.

pub mod deliverables;
pub mod fine_tuning;
pub mod inference;
pub mod proof;
pub mod types;

pub use deliverables::{Deliverable, DeliverableStore};
pub use proof::{decode_chunks, ProofChunk, ProofVerifier, CHUNK_WORDS};
pub use types::{FineTuningClaim, InferenceClaim, SettlementOutcome};
