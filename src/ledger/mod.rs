// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod operations;
pub mod state;
pub mod types;

pub use operations::{DeletedLedger, RetrievalOutcomeKind, RetrievalReport, TransferOutcome};
pub use state::{EscrowParams, EscrowState};
pub use types::{Ledger, LedgerInfo};
