// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::U256;

/// Gas price schedule for one submission: a starting price and a fixed
/// multiplicative step, never above the cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasPolicy {
    step_percent: u64,
    cap: Option<U256>,
}

impl GasPolicy {
    pub fn new(step_percent: u64, cap: Option<U256>) -> Self {
        Self {
            step_percent: step_percent.max(101),
            cap,
        }
    }

    pub fn cap(&self) -> Option<U256> {
        self.cap
    }

    /// Supplied price if the call carries one, else the network estimate,
    /// clamped to the cap
    pub fn starting_price(&self, supplied: Option<U256>, estimated: U256) -> U256 {
        let price = supplied.unwrap_or(estimated).max(U256::one());
        match self.cap {
            Some(cap) => price.min(cap),
            None => price,
        }
    }

    /// Next price in the schedule, or `None` once the cap has been reached
    pub fn escalate(&self, current: U256) -> Option<U256> {
        if let Some(cap) = self.cap {
            if current >= cap {
                return None;
            }
        }
        let stepped = current.saturating_mul(U256::from(self.step_percent)) / U256::from(100u8);
        let next = stepped.max(current.saturating_add(U256::one()));
        Some(match self.cap {
            Some(cap) => next.min(cap),
            None => next,
        })
    }
}
