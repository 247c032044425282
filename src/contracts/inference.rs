// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::prelude::*;

abigen!(
    InferenceServing,
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
                {"internalType": "uint256[2]", "name": "providerPubKey", "type": "uint256[2]"}
            ],
            "name": "acknowledgeProviderSigner",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                {
                    "components": [
                        {"internalType": "bytes", "name": "inProof", "type": "bytes"},
                        {"internalType": "uint256[]", "name": "proofInputs", "type": "uint256[]"},
                        {"internalType": "uint256", "name": "numChunks", "type": "uint256"},
                        {"internalType": "uint256[]", "name": "segmentSize", "type": "uint256[]"}
                    ],
                    "internalType": "struct InferenceVerifierInput",
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
