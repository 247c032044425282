// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod client;
pub mod fine_tuning;
pub mod inference;
pub mod ledger;

pub use client::EscrowChainClient;
pub use fine_tuning::FineTuningServing;
pub use inference::InferenceServing;
pub use ledger::LedgerManager;
