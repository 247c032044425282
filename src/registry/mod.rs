// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod service_registry;
pub mod types;

pub use service_registry::{RegisteredService, ServiceRegistry};
pub use types::{
    FineTuningService, InferenceService, Quota, ServiceDescriptor, VerifiabilityMode,
};
