// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the supervision engine.
//!
//! Each variant maps to a stable machine-readable classifier that the
//! CLI prints alongside the human message. Terminal users never see a
//! stack trace.

use thiserror::Error;

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The parser produced errors the validator cannot reconcile.
    #[error("task document invalid: {detail}")]
    TaskFormatInvalid { detail: String },

    /// Dirty working tree, missing tasks file, failed health check, or
    /// an already-active runner for the same spec. Nothing was spawned.
    #[error("precondition failed: {reason}")]
    PreconditionFailed { reason: String },

    /// The OS refused to create the child process.
    #[error("spawn failed: {0}")]
    SpawnFailed(String),

    /// Too many consecutive iterations without progress.
    #[error("stalled after {streak} iterations without progress")]
    Stalled { streak: u32 },

    #[error(transparent)]
    Persistence(#[from] sw_storage::StorageError),

    #[error(transparent)]
    Probe(#[from] sw_probes::ProbeError),

    #[error(transparent)]
    Adapter(#[from] sw_adapters::AdapterError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Stable machine-readable classifier for CLI output and logs.
    pub fn classifier(&self) -> &'static str {
        match self {
            EngineError::TaskFormatInvalid { .. } => "task-format-invalid",
            EngineError::PreconditionFailed { .. } => "precondition-failed",
            EngineError::SpawnFailed(_) => "spawn-failed",
            EngineError::Stalled { .. } => "stalled",
            EngineError::Persistence(_) => "persistence-error",
            EngineError::Probe(_) => "probe-error",
            EngineError::Adapter(_) => "adapter-error",
            EngineError::Io(_) => "io-error",
        }
    }

    pub(crate) fn precondition(reason: impl Into<String>) -> Self {
        EngineError::PreconditionFailed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
