// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Call-recording fake provider for tests (feature `test-support`).

use super::{binary_basename, Provider, ProviderOverrides};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;

/// Fake provider with a fixed argv.
///
/// The argv is returned verbatim (the prompt is recorded, not passed),
/// so tests can make the "session" any runnable command — `true`,
/// `sleep 30`, or a shell script that edits files and commits.
#[derive(Clone, Debug)]
pub struct FakeProvider {
    argv: Vec<String>,
    health: Result<(), String>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeProvider {
    /// A provider whose sessions exit immediately with success.
    pub fn succeeding() -> Self {
        Self::with_argv(vec!["true".to_string()])
    }

    /// A provider whose sessions exit immediately with failure.
    pub fn failing() -> Self {
        Self::with_argv(vec!["false".to_string()])
    }

    /// A provider whose sessions run the given argv.
    pub fn with_argv(argv: Vec<String>) -> Self {
        Self {
            argv,
            health: Ok(()),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A provider that runs `sh -c <script>` per session.
    pub fn with_script(script: impl Into<String>) -> Self {
        Self::with_argv(vec!["sh".to_string(), "-c".to_string(), script.into()])
    }

    pub fn unhealthy(reason: impl Into<String>) -> Self {
        Self {
            health: Err(reason.into()),
            ..Self::succeeding()
        }
    }

    /// Prompts passed to `build_argv` so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl Provider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-model"
    }

    fn build_argv(
        &self,
        prompt: &str,
        _project_path: &Path,
        _overrides: &ProviderOverrides,
    ) -> Vec<String> {
        self.prompts.lock().push(prompt.to_string());
        self.argv.clone()
    }

    fn health_check(&self, _project_path: &Path) -> Result<(), String> {
        self.health.clone()
    }

    fn cmd_fingerprint(&self) -> String {
        self.argv
            .first()
            .map(|argv0| binary_basename(argv0))
            .unwrap_or_default()
    }
}
