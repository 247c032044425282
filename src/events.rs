// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::types::ServiceKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    pub user: Address,
    pub provider: Address,
    pub kind: ServiceKind,
    pub new_balance: U256,
    pub pending_refund: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EscrowEvent {
    ServiceUpdated {
        provider: Address,
        kind: ServiceKind,
        url: String,
    },
    ServiceRemoved {
        provider: Address,
        kind: ServiceKind,
    },
    BalanceUpdated(BalanceUpdate),
}
