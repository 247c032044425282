// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, Result};
use clap::Args;
use ethers::types::Address;

use super::{parse_address, parse_hex, parse_hex32};
use crate::codec::RequestRecord;
use crate::crypto::{self, PackedKey};

#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Derive the keypair from a 32-byte hex seed instead of randomness
    #[arg(long)]
    pub seed: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct RecordArgs {
    #[arg(long)]
    pub nonce: u64,

    #[arg(long)]
    pub fee: u128,

    #[arg(long, value_parser = parse_address)]
    pub user: Address,

    #[arg(long, value_parser = parse_address)]
    pub provider: Address,
}

impl RecordArgs {
    fn record(&self) -> RequestRecord {
        RequestRecord::new(self.nonce, self.fee, self.user, self.provider)
    }
}

#[derive(Args, Debug)]
pub struct SignRequestArgs {
    /// Packed private key as 32 hex bytes
    #[arg(long, env = "REQUEST_SIGNING_KEY")]
    pub private_key: String,

    #[command(flatten)]
    pub record: RecordArgs,
}

#[derive(Args, Debug)]
pub struct VerifyRequestArgs {
    /// Packed public key as 32 hex bytes
    #[arg(long)]
    pub public_key: String,

    /// 64-byte signature in hex
    #[arg(long)]
    pub signature: String,

    #[command(flatten)]
    pub record: RecordArgs,
}

fn key_json(key: &PackedKey, key_type: &str) -> Result<serde_json::Value> {
    Ok(serde_json::json!({
        "words": [key.0[0].to_string(), key.0[1].to_string()],
        "hex": format!("0x{}", hex::encode(key.to_bytes(key_type)?)),
    }))
}

pub fn keygen(args: KeygenArgs) -> Result<()> {
    let keypair = match args.seed {
        Some(seed) => crypto::keypair_from_seed(&parse_hex32(&seed, "seed")?),
        None => crypto::generate_keypair(),
    };
    let output = serde_json::json!({
        "private_key": key_json(&keypair.private_key, "private")?,
        "public_key": key_json(&keypair.public_key, "public")?,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn sign_request(args: SignRequestArgs) -> Result<()> {
    let private_key = PackedKey::from_bytes(&parse_hex32(&args.private_key, "private key")?);
    let record = args.record.record();
    let signature = crypto::sign_request(&record, &private_key)?;
    let output = serde_json::json!({
        "record": format!("0x{}", hex::encode(record.to_bytes())),
        "signature": format!("0x{}", hex::encode(signature)),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub fn verify_request(args: VerifyRequestArgs) -> Result<()> {
    let public_key = PackedKey::from_bytes(&parse_hex32(&args.public_key, "public key")?);
    let signature = parse_hex(&args.signature, "signature")?;
    let valid = crypto::verify_request(&args.record.record(), &signature, &public_key)?;
    if !valid {
        return Err(anyhow!("Signature does not match record"));
    }
    println!("valid");
    Ok(())
}
