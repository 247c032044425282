// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod keys;
pub mod settlement;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::submission::decode_error;

/// Fabstir escrow CLI
#[derive(Parser, Debug)]
#[command(name = "escrow-cli")]
#[command(version = crate::version::VERSION_NUMBER)]
#[command(about = "Request signing and settlement tools for the Fabstir escrow", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a request-signing keypair
    Keygen(keys::KeygenArgs),

    /// Sign a metered request record
    SignRequest(keys::SignRequestArgs),

    /// Verify a request record signature
    VerifyRequest(keys::VerifyRequestArgs),

    /// Turn a raw submission error into a readable message
    DecodeError(DecodeErrorArgs),

    /// Acknowledge a fine-tuning deliverable as the ledger owner
    AcknowledgeDeliverable(settlement::AcknowledgeDeliverableArgs),

    /// Sign and submit a fine-tuning fee claim as the provider
    SettleFineTuning(settlement::SettleFineTuningArgs),
}

#[derive(Args, Debug)]
pub struct DecodeErrorArgs {
    /// Error text as returned by the node or client library
    pub message: String,
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Keygen(args) => keys::keygen(args),
        Commands::SignRequest(args) => keys::sign_request(args),
        Commands::VerifyRequest(args) => keys::verify_request(args),
        Commands::DecodeError(args) => {
            println!("{}", decode_error(&args.message));
            Ok(())
        }
        Commands::AcknowledgeDeliverable(args) => settlement::acknowledge_deliverable(args).await,
        Commands::SettleFineTuning(args) => settlement::settle_fine_tuning(args).await,
    }
}

pub(crate) fn parse_address(raw: &str) -> std::result::Result<ethers::types::Address, String> {
    raw.trim()
        .parse()
        .map_err(|e| format!("invalid address {}: {}", raw, e))
}

pub(crate) fn parse_hex(raw: &str, what: &str) -> Result<Vec<u8>> {
    hex::decode(raw.trim().trim_start_matches("0x"))
        .map_err(|e| anyhow::anyhow!("Invalid hex for {}: {}", what, e))
}

pub(crate) fn parse_hex32(raw: &str, what: &str) -> Result<[u8; 32]> {
    let bytes = parse_hex(raw, what)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow::anyhow!("{} must be 32 bytes, got {}", what, bytes.len()))
}
