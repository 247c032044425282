// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Binary codec for metered request records.
//!
//! Signed records travel between the SDK, the provider and the proof
//! generator in a fixed 64-byte layout. The layout is shared with records
//! that were signed before this crate existed, so it must never change.

pub mod request;

pub use request::{CodecError, RequestRecord, REQUEST_RECORD_SIZE};
