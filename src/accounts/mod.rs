// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod signers;
pub mod store;

pub use signers::{SignerEntry, SignerRegistry};
pub use store::{Account, AccountStore, RetrievalOutcome};
