// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use async_trait::async_trait;
use ethers::{
    prelude::*,
    providers::{Http, Provider},
    signers::LocalWallet,
    types::transaction::eip2718::TypedTransaction,
};
use std::sync::Arc;

pub type ChainSigner = SignerMiddleware<Arc<Provider<Http>>, LocalWallet>;

/// Raw error text from the node or client library
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Confirmed (latest block) and pending (mempool-inclusive) nonces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonceStatus {
    pub confirmed: U256,
    pub pending: U256,
}

impl NonceStatus {
    pub fn drift(&self) -> U256 {
        self.pending.saturating_sub(self.confirmed)
    }
}

/// The chain operations the submitter needs from one signing identity
#[async_trait]
pub trait ChainBackend: Send + Sync {
    fn sender(&self) -> Address;

    async fn gas_price(&self) -> Result<U256, BackendError>;

    /// Signs and broadcasts; returns the transaction hash
    async fn send(&self, tx: TypedTransaction) -> Result<H256, BackendError>;

    /// `None` while the transaction is not yet mined
    async fn receipt(&self, tx_hash: H256) -> Result<Option<TransactionReceipt>, BackendError>;

    async fn nonces(&self) -> Result<NonceStatus, BackendError>;
}

pub struct EthersBackend {
    client: Arc<ChainSigner>,
}

impl EthersBackend {
    pub fn new(rpc_url: &str, private_key: &str, chain_id: u64) -> anyhow::Result<Self> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| anyhow::anyhow!("Failed to create provider for {}: {}", rpc_url, e))?;
        let wallet = private_key
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map_err(|e| anyhow::anyhow!("Failed to parse private key: {}", e))?
            .with_chain_id(chain_id);
        Ok(Self {
            client: Arc::new(SignerMiddleware::new(Arc::new(provider), wallet)),
        })
    }

    pub fn from_client(client: Arc<ChainSigner>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> Arc<ChainSigner> {
        self.client.clone()
    }
}

#[async_trait]
impl ChainBackend for EthersBackend {
    fn sender(&self) -> Address {
        self.client.address()
    }

    async fn gas_price(&self) -> Result<U256, BackendError> {
        self.client
            .get_gas_price()
            .await
            .map_err(|e| BackendError(e.to_string()))
    }

    async fn send(&self, tx: TypedTransaction) -> Result<H256, BackendError> {
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| BackendError(e.to_string()))?;
        Ok(pending.tx_hash())
    }

    async fn receipt(&self, tx_hash: H256) -> Result<Option<TransactionReceipt>, BackendError> {
        self.client
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| BackendError(e.to_string()))
    }

    async fn nonces(&self) -> Result<NonceStatus, BackendError> {
        let address = self.sender();
        let confirmed = self
            .client
            .get_transaction_count(address, Some(BlockNumber::Latest.into()))
            .await
            .map_err(|e| BackendError(e.to_string()))?;
        let pending = self
            .client
            .get_transaction_count(address, Some(BlockNumber::Pending.into()))
            .await
            .map_err(|e| BackendError(e.to_string()))?;
        Ok(NonceStatus { confirmed, pending })
    }
}
