// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Escrow and settlement core of the Fabstir compute marketplace
//!
//! Users deposit into a custodial ledger and commit funds to providers;
//! providers settle fees against signed, acknowledged or proven usage;
//! settlement calls are landed on-chain by a gas-escalating submitter.

pub mod accounts;
pub mod cli;
pub mod clock;
pub mod codec;
pub mod config;
pub mod contracts;
pub mod crypto;
pub mod error;
pub mod escrow;
pub mod events;
pub mod ledger;
pub mod registry;
pub mod settlement;
pub mod submission;
pub mod types;
pub mod version;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::RequestRecord;
pub use config::{ChainConfig, EscrowConfig, SubmitterConfig};
pub use error::{EscrowError, Result};
pub use escrow::EscrowService;
pub use events::{BalanceUpdate, EscrowEvent};
pub use ledger::{EscrowState, LedgerInfo};
pub use settlement::{FineTuningClaim, InferenceClaim, ProofVerifier, SettlementOutcome};
pub use submission::{ChainBackend, SubmissionError, TransactionSubmitter};
pub use types::{AccountKey, ServiceKind};
