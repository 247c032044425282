// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::prelude::*;

abigen!(
    FineTuningServing,
    r#"[
        {
            "anonymous": false,
            "inputs": [
                {"indexed": true, "internalType": "address", "name": "user", "type": "address"},
                {"indexed": true, "internalType": "address", "name": "provider", "type": "address"},
                {"indexed": false, "internalType": "uint256", "name": "amount", "type": "uint256"},
                {"indexed": false, "internalType": "uint256", "name": "pendingRefund", "type": "uint256"}
            ],
            "name": "BalanceUpdated",
            "type": "event"
        },
        {
            "inputs": [
                {"internalType": "address", "name": "provider", "type": "address"},
                {"internalType": "address", "name": "providerSigner", "type": "address"}
            ],
            "name": "acknowledgeProviderSigner",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                {"internalType": "address", "name": "provider", "type": "address"},
                {"internalType": "uint256", "name": "index", "type": "uint256"}
            ],
            "name": "acknowledgeDeliverable",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                {"internalType": "address", "name": "user", "type": "address"},
                {"internalType": "bytes", "name": "modelRootHash", "type": "bytes"}
            ],
            "name": "addDeliverable",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                {
                    "components": [
                        {"internalType": "uint256", "name": "index", "type": "uint256"},
                        {"internalType": "bytes", "name": "encryptedSecret", "type": "bytes"},
                        {"internalType": "bytes", "name": "modelRootHash", "type": "bytes"},
                        {"internalType": "uint256", "name": "nonce", "type": "uint256"},
                        {"internalType": "address", "name": "providerSigner", "type": "address"},
                        {"internalType": "bytes", "name": "signature", "type": "bytes"},
                        {"internalType": "uint256", "name": "taskFee", "type": "uint256"},
                        {"internalType": "address", "name": "user", "type": "address"}
                    ],
                    "internalType": "struct FineTuningVerifierInput",
                    "name": "verifierInput",
                    "type": "tuple"
                }
            ],
            "name": "settleFees",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        }
    ]"#
);
