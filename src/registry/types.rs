// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use ethers::types::U256;
use serde::{Deserialize, Serialize};

use crate::error::{EscrowError, Result};
use crate::types::ServiceKind;

/// How a provider's output can be checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum VerifiabilityMode {
    #[default]
    None,
    OpML,
    TeeML,
    ZkML,
}

/// Common surface of inference and fine-tuning descriptors
pub trait ServiceDescriptor: Clone + Send + Sync {
    const KIND: ServiceKind;

    fn url(&self) -> &str;

    fn validate(&self) -> Result<()> {
        let url = self.url();
        if url.is_empty() {
            return Err(EscrowError::InvalidService("url must not be empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(EscrowError::InvalidService(format!(
                "url must be http(s): {}",
                url
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceService {
    pub service_type: String,
    pub url: String,
    pub model: String,
    /// Price per input token
    pub input_price: U256,
    /// Price per output token
    pub output_price: U256,
    pub verifiability: VerifiabilityMode,
    #[serde(default)]
    pub additional_info: String,
}

impl ServiceDescriptor for InferenceService {
    const KIND: ServiceKind = ServiceKind::Inference;

    fn url(&self) -> &str {
        &self.url
    }

    fn validate(&self) -> Result<()> {
        if self.model.is_empty() {
            return Err(EscrowError::InvalidService("model must not be empty".to_string()));
        }
        if self.url.is_empty() || !self.url.contains("://") {
            return Err(EscrowError::InvalidService(format!("invalid url: {}", self.url)));
        }
        Ok(())
    }
}

/// Hardware a fine-tuning provider offers per job
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Quota {
    pub cpu_count: u64,
    pub node_memory: u64,
    pub gpu_count: u64,
    pub node_storage: u64,
    pub gpu_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FineTuningService {
    pub url: String,
    pub quota: Quota,
    pub price_per_token: U256,
    pub occupied: bool,
    pub models: Vec<String>,
    pub verifiability: VerifiabilityMode,
}

impl ServiceDescriptor for FineTuningService {
    const KIND: ServiceKind = ServiceKind::FineTuning;

    fn url(&self) -> &str {
        &self.url
    }
}
