// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Sends escrow calls to the deployed contracts through the submitter

use anyhow::{anyhow, Result};
use ethers::contract::parse_log;
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, TransactionReceipt, U256,
};
use std::sync::Arc;
use tracing::info;

use super::fine_tuning::{BalanceUpdatedFilter, FineTuningServing, FineTuningVerifierInput};
use super::inference::{InferenceServing, InferenceVerifierInput};
use super::ledger::LedgerManager;
use crate::config::{ChainConfig, SubmitterConfig};
use crate::crypto::PackedKey;
use crate::events::BalanceUpdate;
use crate::settlement::{FineTuningClaim, InferenceClaim};
use crate::submission::backend::ChainSigner;
use crate::submission::{EthersBackend, SubmissionReceipt, TransactionSubmitter};
use crate::types::ServiceKind;

pub struct EscrowChainClient {
    chain: ChainConfig,
    submitter: TransactionSubmitter<EthersBackend>,
    ledger: LedgerManager<ChainSigner>,
    fine_tuning: FineTuningServing<ChainSigner>,
    inference: InferenceServing<ChainSigner>,
    max_gas_price: Option<U256>,
}

impl EscrowChainClient {
    pub fn new(chain: ChainConfig, private_key: &str, config: SubmitterConfig) -> Result<Self> {
        let backend = Arc::new(EthersBackend::new(&chain.rpc_url, private_key, chain.chain_id)?);
        let client = backend.client();
        info!(
            "Escrow client for {:?} on {} ({})",
            client.address(),
            chain.name,
            chain.chain_id
        );
        Ok(Self {
            ledger: LedgerManager::new(chain.contracts.ledger, client.clone()),
            fine_tuning: FineTuningServing::new(chain.contracts.fine_tuning_serving, client.clone()),
            inference: InferenceServing::new(chain.contracts.inference_serving, client),
            submitter: TransactionSubmitter::new(backend, config),
            chain,
            max_gas_price: None,
        })
    }

    pub fn with_max_gas_price(mut self, max_gas_price: Option<U256>) -> Self {
        self.max_gas_price = max_gas_price;
        self
    }

    pub fn submitter(&self) -> &TransactionSubmitter<EthersBackend> {
        &self.submitter
    }

    async fn submit(&self, tx: TypedTransaction, label: &str, contract: Address) -> Result<SubmissionReceipt> {
        if contract.is_zero() {
            return Err(anyhow!(
                "{} contract not configured for chain {}",
                label,
                self.chain.chain_id
            ));
        }
        let receipt = self
            .submitter
            .submit(tx, self.max_gas_price)
            .await
            .map_err(|e| anyhow!("{} failed: {}", label, e))?;
        info!(
            "{} landed in tx {:?} after {} attempts",
            label,
            receipt.receipt.transaction_hash,
            receipt.attempts.len()
        );
        Ok(receipt)
    }

    pub async fn add_ledger(
        &self,
        signer_key: PackedKey,
        additional_info: String,
        value: U256,
    ) -> Result<SubmissionReceipt> {
        let call = self.ledger.add_ledger(signer_key.0, additional_info).value(value);
        self.submit(call.tx, "addLedger", self.chain.contracts.ledger).await
    }

    pub async fn deposit_fund(&self, amount: U256) -> Result<SubmissionReceipt> {
        let call = self.ledger.deposit_fund().value(amount);
        self.submit(call.tx, "depositFund", self.chain.contracts.ledger).await
    }

    pub async fn refund(&self, amount: U256) -> Result<SubmissionReceipt> {
        let call = self.ledger.refund(amount);
        self.submit(call.tx, "refund", self.chain.contracts.ledger).await
    }

    pub async fn transfer_fund(
        &self,
        provider: Address,
        kind: ServiceKind,
        amount: U256,
    ) -> Result<SubmissionReceipt> {
        let call = self
            .ledger
            .transfer_fund(provider, kind.as_str().to_string(), amount);
        self.submit(call.tx, "transferFund", self.chain.contracts.ledger).await
    }

    pub async fn retrieve_fund(&self, providers: Vec<Address>, kind: ServiceKind) -> Result<SubmissionReceipt> {
        let call = self.ledger.retrieve_fund(providers, kind.as_str().to_string());
        self.submit(call.tx, "retrieveFund", self.chain.contracts.ledger).await
    }

    pub async fn delete_ledger(&self) -> Result<SubmissionReceipt> {
        let call = self.ledger.delete_ledger();
        self.submit(call.tx, "deleteLedger", self.chain.contracts.ledger).await
    }

    pub async fn acknowledge_fine_tuning_signer(
        &self,
        provider: Address,
        signer: Address,
    ) -> Result<SubmissionReceipt> {
        let call = self.fine_tuning.acknowledge_provider_signer(provider, signer);
        self.submit(
            call.tx,
            "acknowledgeProviderSigner",
            self.chain.contracts.fine_tuning_serving,
        )
        .await
    }

    pub async fn acknowledge_deliverable(&self, provider: Address, index: u64) -> Result<SubmissionReceipt> {
        let call = self
            .fine_tuning
            .acknowledge_deliverable(provider, U256::from(index));
        self.submit(
            call.tx,
            "acknowledgeDeliverable",
            self.chain.contracts.fine_tuning_serving,
        )
        .await
    }

    pub async fn add_deliverable(&self, user: Address, model_root_hash: Bytes) -> Result<SubmissionReceipt> {
        let call = self.fine_tuning.add_deliverable(user, model_root_hash);
        self.submit(call.tx, "addDeliverable", self.chain.contracts.fine_tuning_serving)
            .await
    }

    pub async fn settle_fine_tuning(&self, claim: &FineTuningClaim) -> Result<SubmissionReceipt> {
        let input = FineTuningVerifierInput {
            index: U256::from(claim.index),
            encrypted_secret: claim.encrypted_secret.clone(),
            model_root_hash: claim.model_root_hash.clone(),
            nonce: claim.nonce,
            provider_signer: claim.provider_signer,
            signature: claim.signature.clone(),
            task_fee: claim.task_fee,
            user: claim.user,
        };
        let call = self.fine_tuning.settle_fees(input);
        self.submit(call.tx, "settleFees", self.chain.contracts.fine_tuning_serving)
            .await
    }

    pub async fn acknowledge_inference_signer(
        &self,
        provider: Address,
        signer_key: PackedKey,
    ) -> Result<SubmissionReceipt> {
        let call = self.inference.acknowledge_provider_signer(provider, signer_key.0);
        self.submit(
            call.tx,
            "acknowledgeProviderSigner",
            self.chain.contracts.inference_serving,
        )
        .await
    }

    pub async fn settle_inference(&self, claim: &InferenceClaim) -> Result<SubmissionReceipt> {
        let input = InferenceVerifierInput {
            in_proof: claim.proof.clone(),
            proof_inputs: claim.public_inputs.clone(),
            num_chunks: U256::from(claim.num_chunks),
            segment_size: claim.segment_size.iter().map(|s| U256::from(*s)).collect(),
        };
        let call = self.inference.settle_fees(input);
        self.submit(call.tx, "settleFees", self.chain.contracts.inference_serving)
            .await
    }
}

/// BalanceUpdated events carried by a settlement receipt
pub fn balance_updates(receipt: &TransactionReceipt, kind: ServiceKind) -> Vec<BalanceUpdate> {
    receipt
        .logs
        .iter()
        .filter_map(|log| parse_log::<BalanceUpdatedFilter>(log.clone()).ok())
        .map(|event| BalanceUpdate {
            user: event.user,
            provider: event.provider,
            kind,
            new_balance: event.amount,
            pending_refund: event.pending_refund,
        })
        .collect()
}
