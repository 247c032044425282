// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Fabstir escrow core

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-escrow-settlement-2026-10-17";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Build date
pub const BUILD_DATE: &str = "2026-10-17";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "escrow-ledger",
    "timed-refunds",
    "fine-tuning-settlement",
    "penalty-settlement",
    "batched-inference-settlement",
    "request-signing",
    "secret-sealing",
    "gas-escalation",
    "nonce-drift-recovery",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Fabstir Escrow {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info as JSON
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
