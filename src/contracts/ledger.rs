// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::prelude::*;

abigen!(
    LedgerManager,
    r#"[
        {
            "inputs": [
                {"internalType": "uint256[2]", "name": "inferenceSigner", "type": "uint256[2]"},
                {"internalType": "string", "name": "additionalInfo", "type": "string"}
            ],
            "name": "addLedger",
            "outputs": [
                {"internalType": "uint256", "name": "", "type": "uint256"},
                {"internalType": "uint256", "name": "", "type": "uint256"}
            ],
            "stateMutability": "payable",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "depositFund",
            "outputs": [],
            "stateMutability": "payable",
            "type": "function"
        },
        {
            "inputs": [{"internalType": "uint256", "name": "amount", "type": "uint256"}],
            "name": "refund",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                {"internalType": "address", "name": "provider", "type": "address"},
                {"internalType": "string", "name": "serviceTypeStr", "type": "string"},
                {"internalType": "uint256", "name": "amount", "type": "uint256"}
            ],
            "name": "transferFund",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                {"internalType": "address[]", "name": "providers", "type": "address[]"},
                {"internalType": "string", "name": "serviceType", "type": "string"}
            ],
            "name": "retrieveFund",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "deleteLedger",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [{"internalType": "address", "name": "user", "type": "address"}],
            "name": "getLedger",
            "outputs": [
                {"internalType": "uint256", "name": "availableBalance", "type": "uint256"},
                {"internalType": "uint256", "name": "totalBalance", "type": "uint256"},
                {"internalType": "string", "name": "additionalInfo", "type": "string"}
            ],
            "stateMutability": "view",
            "type": "function"
        }
    ]"#
);
