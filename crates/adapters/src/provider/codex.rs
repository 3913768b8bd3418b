// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Codex CLI provider.

use super::{binary_basename, push_extra_args, Provider, ProviderOverrides};
use std::path::Path;

const CODEX_BINARY: &str = "codex";

/// Provider for the `codex` CLI. No auxiliary integration to check.
#[derive(Debug)]
pub struct CodexProvider {
    model: String,
}

impl CodexProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

impl Provider for CodexProvider {
    fn name(&self) -> &str {
        "codex"
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn build_argv(
        &self,
        prompt: &str,
        project_path: &Path,
        overrides: &ProviderOverrides,
    ) -> Vec<String> {
        let mut argv = vec![
            CODEX_BINARY.to_string(),
            "exec".to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--cd".to_string(),
            project_path.display().to_string(),
            "--full-auto".to_string(),
            prompt.to_string(),
        ];
        push_extra_args(&mut argv, overrides);
        argv
    }

    fn health_check(&self, _project_path: &Path) -> Result<(), String> {
        Ok(())
    }

    fn cmd_fingerprint(&self) -> String {
        binary_basename(CODEX_BINARY)
    }
}
