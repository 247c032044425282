// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, U256};
use tracing::info;

use super::{parse_address, parse_hex, parse_hex32};
use crate::config::{ChainConfig, SubmitterConfig};
use crate::contracts::EscrowChainClient;
use crate::crypto::sign_claim;
use crate::settlement::FineTuningClaim;

#[derive(Args, Debug)]
pub struct AcknowledgeDeliverableArgs {
    #[arg(long, value_parser = parse_address)]
    pub provider: Address,

    #[arg(long)]
    pub index: u64,

    /// Ledger owner's chain key
    #[arg(long, env = "PRIVATE_KEY")]
    pub private_key: String,
}

#[derive(Args, Debug)]
pub struct SettleFineTuningArgs {
    #[arg(long, value_parser = parse_address)]
    pub user: Address,

    /// Deliverable index
    #[arg(long)]
    pub index: u64,

    #[arg(long)]
    pub nonce: u64,

    /// Task fee in wei
    #[arg(long)]
    pub fee: String,

    #[arg(long)]
    pub model_root_hash: String,

    /// Secret sealed to the user key; omit for an unacknowledged deliverable
    #[arg(long)]
    pub encrypted_secret: Option<String>,

    /// Key of the provider signer the user acknowledged
    #[arg(long, env = "PROVIDER_SIGNER_KEY")]
    pub signer_key: String,

    /// Provider's chain key that pays for the transaction
    #[arg(long, env = "PRIVATE_KEY")]
    pub private_key: String,

    /// Upper bound for gas price escalation, in wei
    #[arg(long)]
    pub max_gas_price: Option<String>,
}

fn client(private_key: &str, max_gas_price: Option<U256>) -> Result<EscrowChainClient> {
    let chain = ChainConfig::from_env()?;
    let submitter = SubmitterConfig::from_env()?;
    Ok(EscrowChainClient::new(chain, private_key, submitter)?.with_max_gas_price(max_gas_price))
}

fn parse_wei(raw: &str, what: &str) -> Result<U256> {
    U256::from_dec_str(raw.trim()).map_err(|e| anyhow!("Invalid {}: {}", what, e))
}

pub async fn acknowledge_deliverable(args: AcknowledgeDeliverableArgs) -> Result<()> {
    let client = client(&args.private_key, None)?;
    let receipt = client
        .acknowledge_deliverable(args.provider, args.index)
        .await?;
    println!("{:?}", receipt.receipt.transaction_hash);
    Ok(())
}

/// Builds and signs the claim locally before submitting it
pub fn build_claim(args: &SettleFineTuningArgs) -> Result<FineTuningClaim> {
    let signer_key = parse_hex32(&args.signer_key, "signer key")?;
    let provider_signer = LocalWallet::from_bytes(&signer_key)
        .map_err(|e| anyhow!("Invalid signer key: {}", e))?
        .address();
    let encrypted_secret = match &args.encrypted_secret {
        Some(raw) => parse_hex(raw, "encrypted secret")?,
        None => Vec::new(),
    };

    let mut claim = FineTuningClaim {
        index: args.index,
        encrypted_secret: Bytes::from(encrypted_secret),
        model_root_hash: Bytes::from(parse_hex(&args.model_root_hash, "model root hash")?),
        nonce: U256::from(args.nonce),
        provider_signer,
        signature: Bytes::new(),
        task_fee: parse_wei(&args.fee, "fee")?,
        user: args.user,
    };
    let signature = sign_claim(&signer_key, &claim.digest())?;
    claim.signature = Bytes::from(signature.to_vec());
    Ok(claim)
}

pub async fn settle_fine_tuning(args: SettleFineTuningArgs) -> Result<()> {
    let claim = build_claim(&args)?;
    let max_gas_price = args
        .max_gas_price
        .as_deref()
        .map(|raw| parse_wei(raw, "max gas price"))
        .transpose()?;
    info!(
        "Settling deliverable {} for {:?}, fee {}",
        claim.index, claim.user, claim.task_fee
    );
    let client = client(&args.private_key, max_gas_price)?;
    let receipt = client.settle_fine_tuning(&claim).await?;
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "tx_hash": format!("{:?}", receipt.receipt.transaction_hash),
            "attempts": receipt.attempts.len(),
            "final_gas_price": receipt.final_gas_price().map(|p| p.to_string()),
        }))?
    );
    Ok(())
}
