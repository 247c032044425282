// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Classifying and decoding submission errors

use ethers::utils::id;
use regex::Regex;
use std::sync::OnceLock;

/// Custom errors raised by the escrow contracts
const KNOWN_CONTRACT_ERRORS: &[(&str, &str)] = &[
    ("LedgerNotExists(address)", "Ledger does not exist"),
    ("LedgerExists(address)", "Ledger already exists"),
    ("InsufficientBalance(address)", "Insufficient balance in ledger"),
    ("AccountNotExists(address,address)", "Account does not exist"),
    ("AccountExists(address,address)", "Account already exists"),
    ("ServiceNotExist(address)", "Service does not exist"),
    ("DeliverableNotExists(address,address,uint256)", "Deliverable does not exist"),
    ("CallerNotLedger(address)", "Caller is not the ledger contract"),
    ("OwnableUnauthorizedAccount(address)", "Caller is not the contract owner"),
];

/// Client-side failure codes surfaced by RPC libraries
const KNOWN_FAILURE_CODES: &[(&str, &str)] = &[
    ("INSUFFICIENT_FUNDS", "Insufficient funds to pay for gas"),
    ("NONCE_EXPIRED", "Nonce has already been used"),
    ("REPLACEMENT_UNDERPRICED", "Replacement transaction gas price too low"),
    ("UNPREDICTABLE_GAS_LIMIT", "Gas estimation failed; the call would revert"),
    ("CALL_EXCEPTION", "Contract call reverted"),
    ("ACTION_REJECTED", "Transaction rejected by the signer"),
];

fn selector_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"0x[0-9a-fA-F]{8}").expect("static regex"))
}

fn reason_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?:reason=|reason:\s*|reverted with reason string )["']([^"']+)["']"#)
            .expect("static regex")
    })
}

fn revert_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"execution reverted:\s*([^,\n\]\)"]+)"#).expect("static regex"))
}

fn short_message_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""?shortMessage"?\s*[=:]\s*"([^"]+)""#).expect("static regex")
    })
}

/// True when the message contains any of the transient substrings
pub fn is_transient(message: &str, patterns: &[String]) -> bool {
    let lowered = message.to_lowercase();
    patterns
        .iter()
        .any(|p| !p.is_empty() && lowered.contains(&p.to_lowercase()))
}

/// Human-readable form of a failed submission: known contract error
/// selectors and failure codes first, then an extracted revert reason or
/// short message, then the raw text.
pub fn decode_error(message: &str) -> String {
    for found in selector_regex().find_iter(message) {
        let selector = found.as_str().to_lowercase();
        for (signature, friendly) in KNOWN_CONTRACT_ERRORS {
            if selector == format!("0x{}", hex::encode(id(signature))) {
                return format!("{} ({})", friendly, signature);
            }
        }
    }

    for (code, friendly) in KNOWN_FAILURE_CODES {
        if message.contains(code) {
            return friendly.to_string();
        }
    }

    if let Some(caps) = reason_regex().captures(message) {
        return caps[1].trim().to_string();
    }
    if let Some(caps) = revert_regex().captures(message) {
        return caps[1].trim().to_string();
    }
    if let Some(caps) = short_message_regex().captures(message) {
        return caps[1].trim().to_string();
    }

    message.trim().to_string()
}
