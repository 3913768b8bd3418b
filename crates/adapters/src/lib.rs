// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-adapters: the narrow boundaries to external collaborators.
//!
//! Three capability sets, each a trait plus a subprocess-backed
//! implementation: the AI [`provider::Provider`] that runs sessions,
//! the [`probe::CompletionProbe`] that asks a session whether it is
//! done, and the [`rescue::Rescue`] collaborator that turns uncommitted
//! work into commits. Every boundary yields a typed outcome; none of
//! them use errors as control flow.

pub mod probe;
pub mod provider;
pub mod rescue;

pub use probe::{extract_json, parse_reply, CommandProbe, CompletionProbe, ProbeReply, ProbeStatus};
pub use provider::{provider_for, Provider, ProviderOverrides};
pub use rescue::{CommandRescue, Rescue, RescueOutcome};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use probe::fake::FakeProbe;
#[cfg(any(test, feature = "test-support"))]
pub use provider::fake::FakeProvider;
#[cfg(any(test, feature = "test-support"))]
pub use rescue::fake::FakeRescue;

use thiserror::Error;

/// Errors from adapter operations.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider {provider} failed its health check: {reason}")]
    HealthCheck { provider: String, reason: String },
    #[error(transparent)]
    Probe(#[from] sw_probes::ProbeError),
}
