// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! AI provider adapters.
//!
//! A provider knows how to turn a prompt into an argv for its CLI and
//! how to verify that its auxiliary integrations are present before a
//! session starts. The set of recognized provider names is closed;
//! model names pass through opaquely.

mod claude;
mod codex;

pub use claude::ClaudeProvider;
pub use codex::CodexProvider;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake;

use crate::AdapterError;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Opaque provider configuration pass-through from the config file.
pub type ProviderOverrides = BTreeMap<String, toml::Value>;

/// An AI provider capable of running a coding session as a subprocess.
pub trait Provider: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Build the argv for one session. Pure: no filesystem access, no
    /// side effects.
    fn build_argv(
        &self,
        prompt: &str,
        project_path: &Path,
        overrides: &ProviderOverrides,
    ) -> Vec<String>;

    /// Verify any auxiliary integration the provider depends on.
    fn health_check(&self, project_path: &Path) -> Result<(), String>;

    /// Stable argv substring used with the pid to defeat PID reuse.
    fn cmd_fingerprint(&self) -> String;
}

/// Resolve a provider by name. The name set is closed.
pub fn provider_for(name: &str, model: &str) -> Result<Arc<dyn Provider>, AdapterError> {
    match name {
        "claude" => Ok(Arc::new(ClaudeProvider::new(model))),
        "codex" => Ok(Arc::new(CodexProvider::new(model))),
        other => Err(AdapterError::UnknownProvider(other.to_string())),
    }
}

/// Extract the binary basename from an argv head.
///
/// Handles absolute paths (`/usr/bin/claude` → `claude`), relative
/// paths, and plain names.
pub(crate) fn binary_basename(argv0: &str) -> String {
    argv0
        .rsplit('/')
        .next()
        .unwrap_or(argv0)
        .to_string()
}

/// Append `extra_args` from the overrides table, if present.
pub(crate) fn push_extra_args(argv: &mut Vec<String>, overrides: &ProviderOverrides) {
    if let Some(toml::Value::Array(extra)) = overrides.get("extra_args") {
        for value in extra {
            if let toml::Value::String(arg) = value {
                argv.push(arg.clone());
            }
        }
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
