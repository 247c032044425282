// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Contract-facing escrow service
//!
//! Each method mirrors one contract entry point. `caller` plays the role of
//! `msg.sender`: users act on their own ledger, providers on their own
//! services and claims, the owner on parameters.

use ethers::types::{Address, Bytes, U256};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::accounts::{Account, SignerEntry};
use crate::clock::{Clock, SystemClock};
use crate::config::EscrowConfig;
use crate::crypto::PackedKey;
use crate::error::{EscrowError, Result};
use crate::events::EscrowEvent;
use crate::ledger::{
    DeletedLedger, EscrowParams, EscrowState, LedgerInfo, RetrievalReport, TransferOutcome,
};
use crate::registry::{FineTuningService, InferenceService, RegisteredService};
use crate::settlement::{
    Deliverable, FineTuningClaim, InferenceClaim, ProofVerifier, SettlementOutcome,
};
use crate::types::{AccountKey, ServiceKind};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EscrowService {
    state: Arc<RwLock<EscrowState>>,
    owner: Address,
    verifier: Arc<dyn ProofVerifier>,
    clock: Arc<dyn Clock>,
    event_subscribers: Arc<RwLock<Vec<mpsc::Sender<EscrowEvent>>>>,
}

impl EscrowService {
    pub fn new(config: &EscrowConfig, verifier: Arc<dyn ProofVerifier>) -> Self {
        Self::with_clock(config, verifier, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: &EscrowConfig,
        verifier: Arc<dyn ProofVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        info!(
            "Escrow service started: owner {:?}, lock time {}s, penalty {}%",
            config.owner, config.lock_time_secs, config.penalty_percentage
        );
        Self {
            state: Arc::new(RwLock::new(EscrowState::new(EscrowParams::from(config)))),
            owner: config.owner,
            verifier,
            clock,
            event_subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub async fn subscribe_to_events(&self) -> mpsc::Receiver<EscrowEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.event_subscribers.write().await.push(tx);
        rx
    }

    /// Callers hold the state write guard so events leave in the order
    /// their mutations were applied.
    async fn emit_events(&self, events: Vec<EscrowEvent>) {
        if events.is_empty() {
            return;
        }
        let mut subscribers = self.event_subscribers.write().await;
        subscribers.retain(|tx| !tx.is_closed());
        for event in events {
            debug!("Emitting {:?}", event);
            for tx in subscribers.iter() {
                if tx.try_send(event.clone()).is_err() {
                    warn!("Event subscriber lagging, dropped event");
                }
            }
        }
    }

    /// Copy of the full state, for inspection and invariant checks
    pub async fn snapshot(&self) -> EscrowState {
        self.state.read().await.clone()
    }

    // Ledger

    pub async fn add_ledger(
        &self,
        caller: Address,
        signer_key: PackedKey,
        additional_info: String,
        value: U256,
    ) -> Result<LedgerInfo> {
        let now = self.clock.now();
        self.state
            .write()
            .await
            .add_ledger(caller, signer_key, additional_info, value, now)
    }

    pub async fn deposit(&self, caller: Address, amount: U256) -> Result<LedgerInfo> {
        let now = self.clock.now();
        self.state.write().await.deposit(caller, amount, now)
    }

    pub async fn refund(&self, caller: Address, amount: U256) -> Result<LedgerInfo> {
        self.state.write().await.refund(caller, amount)
    }

    pub async fn transfer_fund(
        &self,
        caller: Address,
        provider: Address,
        kind: ServiceKind,
        amount: U256,
    ) -> Result<TransferOutcome> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let outcome = state.transfer_fund(caller, provider, kind, amount, now)?;
        self.emit_events(vec![EscrowEvent::BalanceUpdated(outcome.update.clone())])
            .await;
        drop(state);
        Ok(outcome)
    }

    pub async fn retrieve_fund(
        &self,
        caller: Address,
        providers: &[Address],
        kind: ServiceKind,
    ) -> Result<RetrievalReport> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let report = state.retrieve_fund(caller, providers, kind, now)?;
        self.emit_events(
            report
                .updates
                .iter()
                .cloned()
                .map(EscrowEvent::BalanceUpdated)
                .collect(),
        )
        .await;
        drop(state);
        Ok(report)
    }

    pub async fn delete_ledger(&self, caller: Address) -> Result<DeletedLedger> {
        self.state.write().await.delete_ledger(caller)
    }

    pub async fn update_additional_info(&self, caller: Address, info: String) -> Result<LedgerInfo> {
        self.state.write().await.update_additional_info(caller, info)
    }

    pub async fn get_ledger(&self, user: Address) -> Result<LedgerInfo> {
        self.state.read().await.get_ledger(user)
    }

    pub async fn get_all_ledgers(&self) -> Vec<LedgerInfo> {
        self.state.read().await.all_ledgers()
    }

    pub async fn get_account(
        &self,
        user: Address,
        provider: Address,
        kind: ServiceKind,
    ) -> Result<Account> {
        self.state
            .read()
            .await
            .accounts()
            .require(&AccountKey::new(user, provider, kind))
            .cloned()
    }

    pub async fn get_accounts_by_provider(&self, provider: Address, kind: ServiceKind) -> Vec<Account> {
        self.state.read().await.accounts().for_provider(provider, kind)
    }

    pub async fn get_all_accounts(&self, kind: ServiceKind) -> Vec<Account> {
        self.state.read().await.accounts().all(kind)
    }

    pub async fn get_accounts_by_user(&self, user: Address) -> Vec<Account> {
        self.state.read().await.accounts().for_user(user, None)
    }

    pub async fn provider_earnings(&self, provider: Address) -> U256 {
        self.state.read().await.earnings(provider)
    }

    // Service registry

    pub async fn add_or_update_inference_service(
        &self,
        caller: Address,
        service: InferenceService,
    ) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let event = state.inference_services.add_or_update(caller, service, now)?;
        self.emit_events(vec![event]).await;
        drop(state);
        Ok(())
    }

    pub async fn remove_inference_service(&self, caller: Address) -> Result<()> {
        let mut state = self.state.write().await;
        let event = state.inference_services.remove(caller)?;
        self.emit_events(vec![event]).await;
        drop(state);
        Ok(())
    }

    pub async fn get_inference_service(
        &self,
        provider: Address,
    ) -> Result<RegisteredService<InferenceService>> {
        self.state
            .read()
            .await
            .inference_services()
            .get(provider)
            .cloned()
    }

    pub async fn get_all_inference_services(&self) -> Vec<RegisteredService<InferenceService>> {
        self.state.read().await.inference_services().all()
    }

    pub async fn add_or_update_fine_tuning_service(
        &self,
        caller: Address,
        service: FineTuningService,
    ) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let event = state.fine_tuning_services.add_or_update(caller, service, now)?;
        self.emit_events(vec![event]).await;
        drop(state);
        Ok(())
    }

    pub async fn remove_fine_tuning_service(&self, caller: Address) -> Result<()> {
        let mut state = self.state.write().await;
        let event = state.fine_tuning_services.remove(caller)?;
        self.emit_events(vec![event]).await;
        drop(state);
        Ok(())
    }

    /// Flips the occupied flag of the caller's fine-tuning service
    pub async fn mark_service_occupied(&self, caller: Address, occupied: bool) -> Result<()> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let entry = state.fine_tuning_services.get_mut(caller)?;
        entry.descriptor.occupied = occupied;
        entry.updated_at = now;
        let url = entry.descriptor.url.clone();
        self.emit_events(vec![EscrowEvent::ServiceUpdated {
            provider: caller,
            kind: ServiceKind::FineTuning,
            url,
        }])
        .await;
        drop(state);
        Ok(())
    }

    pub async fn get_fine_tuning_service(
        &self,
        provider: Address,
    ) -> Result<RegisteredService<FineTuningService>> {
        self.state
            .read()
            .await
            .fine_tuning_services()
            .get(provider)
            .cloned()
    }

    pub async fn get_all_fine_tuning_services(&self) -> Vec<RegisteredService<FineTuningService>> {
        self.state.read().await.fine_tuning_services().all()
    }

    // Fine-tuning settlement

    pub async fn acknowledge_fine_tuning_signer(
        &self,
        caller: Address,
        provider: Address,
        signer: Address,
    ) -> Result<SignerEntry<Address>> {
        let now = self.clock.now();
        self.state
            .write()
            .await
            .acknowledge_fine_tuning_signer(caller, provider, signer, now)
    }

    pub async fn add_deliverable(
        &self,
        caller: Address,
        user: Address,
        model_root_hash: Bytes,
    ) -> Result<u64> {
        let now = self.clock.now();
        self.state
            .write()
            .await
            .add_deliverable(caller, user, model_root_hash, now)
    }

    pub async fn acknowledge_deliverable(
        &self,
        caller: Address,
        provider: Address,
        index: u64,
    ) -> Result<()> {
        self.state
            .write()
            .await
            .acknowledge_deliverable(caller, provider, index)
    }

    pub async fn get_deliverable(
        &self,
        user: Address,
        provider: Address,
        index: u64,
    ) -> Result<Deliverable> {
        self.state
            .read()
            .await
            .deliverables()
            .get(user, provider, index)
            .cloned()
    }

    pub async fn settle_fine_tuning_fees(
        &self,
        caller: Address,
        claim: FineTuningClaim,
    ) -> Result<SettlementOutcome> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let outcome = state.settle_fine_tuning(caller, &claim, now)?;
        self.emit_settlement(&outcome).await;
        drop(state);
        Ok(outcome)
    }

    // Inference settlement

    pub async fn acknowledge_inference_signer(
        &self,
        caller: Address,
        provider: Address,
        signer_key: PackedKey,
    ) -> Result<SignerEntry<PackedKey>> {
        let now = self.clock.now();
        self.state
            .write()
            .await
            .acknowledge_inference_signer(caller, provider, signer_key, now)
    }

    pub async fn settle_inference_fees(
        &self,
        caller: Address,
        claim: InferenceClaim,
    ) -> Result<SettlementOutcome> {
        let now = self.clock.now();
        let mut state = self.state.write().await;
        let outcome = state.settle_inference(caller, &claim, self.verifier.as_ref(), now)?;
        self.emit_settlement(&outcome).await;
        drop(state);
        Ok(outcome)
    }

    async fn emit_settlement(&self, outcome: &SettlementOutcome) {
        self.emit_events(
            outcome
                .updates
                .iter()
                .cloned()
                .map(EscrowEvent::BalanceUpdated)
                .collect(),
        )
        .await;
    }

    // Administration

    fn require_owner(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            warn!("Rejected admin call from {:?}", caller);
            return Err(EscrowError::Unauthorized(format!(
                "{:?} is not the contract owner",
                caller
            )));
        }
        Ok(())
    }

    pub async fn update_lock_time(&self, caller: Address, lock_time_secs: u64) -> Result<()> {
        self.require_owner(caller)?;
        self.state.write().await.set_lock_time(lock_time_secs);
        info!("Lock time set to {}s", lock_time_secs);
        Ok(())
    }

    pub async fn update_penalty_percentage(&self, caller: Address, percentage: u8) -> Result<()> {
        self.require_owner(caller)?;
        self.state.write().await.set_penalty_percentage(percentage)?;
        info!("Penalty percentage set to {}%", percentage);
        Ok(())
    }

    pub async fn params(&self) -> EscrowParams {
        self.state.read().await.params()
    }
}
