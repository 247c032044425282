// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use super::types::ServiceDescriptor;
use crate::error::{EscrowError, Result};
use crate::events::EscrowEvent;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredService<S> {
    pub provider: Address,
    pub descriptor: S,
    pub updated_at: u64,
}

/// One descriptor per provider for a single service kind.
/// Writes are keyed by the caller, so only a provider can touch its own entry.
#[derive(Debug, Clone)]
pub struct ServiceRegistry<S> {
    services: BTreeMap<Address, RegisteredService<S>>,
}

impl<S> Default for ServiceRegistry<S> {
    fn default() -> Self {
        Self {
            services: BTreeMap::new(),
        }
    }
}

impl<S: ServiceDescriptor> ServiceRegistry<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_or_update(
        &mut self,
        provider: Address,
        descriptor: S,
        now: u64,
    ) -> Result<EscrowEvent> {
        descriptor.validate()?;
        let url = descriptor.url().to_string();
        let replaced = self
            .services
            .insert(
                provider,
                RegisteredService {
                    provider,
                    descriptor,
                    updated_at: now,
                },
            )
            .is_some();
        info!(
            "{} service {} for provider {:?} at {}",
            S::KIND,
            if replaced { "updated" } else { "registered" },
            provider,
            url
        );
        Ok(EscrowEvent::ServiceUpdated {
            provider,
            kind: S::KIND,
            url,
        })
    }

    pub fn remove(&mut self, provider: Address) -> Result<EscrowEvent> {
        self.services
            .remove(&provider)
            .ok_or(EscrowError::ServiceNotFound {
                provider,
                kind: S::KIND,
            })?;
        info!("{} service removed for provider {:?}", S::KIND, provider);
        Ok(EscrowEvent::ServiceRemoved {
            provider,
            kind: S::KIND,
        })
    }

    pub fn get(&self, provider: Address) -> Result<&RegisteredService<S>> {
        self.services.get(&provider).ok_or(EscrowError::ServiceNotFound {
            provider,
            kind: S::KIND,
        })
    }

    pub fn get_mut(&mut self, provider: Address) -> Result<&mut RegisteredService<S>> {
        self.services
            .get_mut(&provider)
            .ok_or(EscrowError::ServiceNotFound {
                provider,
                kind: S::KIND,
            })
    }

    pub fn contains(&self, provider: Address) -> bool {
        self.services.contains_key(&provider)
    }

    pub fn all(&self) -> Vec<RegisteredService<S>> {
        self.services.values().cloned().collect()
    }
}
