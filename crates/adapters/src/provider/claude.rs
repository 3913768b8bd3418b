// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Claude CLI provider.

use super::{binary_basename, push_extra_args, Provider, ProviderOverrides};
use std::path::Path;

const CLAUDE_BINARY: &str = "claude";

/// Provider for the `claude` CLI.
///
/// Sessions run headless (`-p`) with permission prompts suppressed;
/// the task workflow depends on the spec-workflow MCP server being
/// configured in the project, which the health check verifies.
#[derive(Debug)]
pub struct ClaudeProvider {
    model: String,
}

impl ClaudeProvider {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }
}

impl Provider for ClaudeProvider {
    fn name(&self) -> &str {
        "claude"
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
            CLAUDE_BINARY.to_string(),
            "-p".to_string(),
            prompt.to_string(),
            "--model".to_string(),
            self.model.clone(),
            "--add-dir".to_string(),
            project_path.display().to_string(),
            "--dangerously-skip-permissions".to_string(),
        ];
        push_extra_args(&mut argv, overrides);
        argv
    }

    fn health_check(&self, project_path: &Path) -> Result<(), String> {
        let mcp_config = project_path.join(".mcp.json");
        let text = std::fs::read_to_string(&mcp_config)
            .map_err(|_| format!("{} not found", mcp_config.display()))?;
        if text.contains("spec-workflow") {
            Ok(())
        } else {
            Err("spec-workflow MCP server is not configured in .mcp.json".to_string())
        }
    }

    fn cmd_fingerprint(&self) -> String {
        binary_basename(CLAUDE_BINARY)
    }
}
