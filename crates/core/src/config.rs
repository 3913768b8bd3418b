// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner configuration.
//!
//! Loaded from a TOML file; every key has a default so an absent or
//! empty file yields a working configuration. Unknown keys are ignored.
//! `config_hash()` digests the fields that change runner behavior, so a
//! restored runner record can detect that it was started under a
//! different configuration.

use crate::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Smart completion tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionConfig {
    #[serde(default = "default_max_probes")]
    pub max_probes: u32,
    #[serde(default = "default_probe_interval_s")]
    pub probe_interval_s: f64,
    #[serde(default = "default_probe_timeout_s")]
    pub probe_timeout_s: f64,
    /// Attempt one last commit rescue after the probe budget is spent
    #[serde(default = "default_final_rescue")]
    pub final_rescue: bool,
}

fn default_max_probes() -> u32 {
    5
}

fn default_probe_interval_s() -> f64 {
    30.0
}

fn default_probe_timeout_s() -> f64 {
    60.0
}

fn default_final_rescue() -> bool {
    true
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_probes: default_max_probes(),
            probe_interval_s: default_probe_interval_s(),
            probe_timeout_s: default_probe_timeout_s(),
            final_rescue: default_final_rescue(),
        }
    }
}

/// Top-level configuration for the runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory scanned for projects
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,
    /// Subdirectory whose presence marks a project
    #[serde(default = "default_workflow_dir_name")]
    pub workflow_dir_name: String,
    #[serde(default = "default_tasks_filename")]
    pub tasks_filename: String,
    #[serde(default = "default_poll_interval_s")]
    pub poll_interval_s: f64,
    #[serde(default = "default_log_tail_bytes")]
    pub log_tail_bytes: u64,
    /// UI hint only; the core never enforces it
    #[serde(default = "default_min_terminal_cols")]
    pub min_terminal_cols: u16,
    /// UI hint only; the core never enforces it
    #[serde(default = "default_min_terminal_rows")]
    pub min_terminal_rows: u16,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_true")]
    pub commit_gate_enabled: bool,
    #[serde(default = "default_true")]
    pub three_phase_enabled: bool,
    #[serde(default)]
    pub completion: CompletionConfig,
    /// Consecutive no-progress iterations before the driver halts
    #[serde(default = "default_no_commit_limit")]
    pub no_commit_limit: u32,
    /// Opaque pass-through to the provider adapter
    #[serde(default)]
    pub provider_config_overrides: BTreeMap<String, toml::Value>,
    /// Paths matching any of these regexes are treated as mock/test-only
    #[serde(default = "default_mock_only_path_patterns")]
    pub mock_only_path_patterns: Vec<String>,
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_workflow_dir_name() -> String {
    ".spec-workflow".to_string()
}

fn default_tasks_filename() -> String {
    "tasks.md".to_string()
}

fn default_poll_interval_s() -> f64 {
    2.0
}

fn default_log_tail_bytes() -> u64 {
    16 * 1024
}

fn default_min_terminal_cols() -> u16 {
    80
}

fn default_min_terminal_rows() -> u16 {
    24
}

fn default_true() -> bool {
    true
}

fn default_no_commit_limit() -> u32 {
    3
}

/// Default mock/test-only path classifiers.
pub fn default_mock_only_path_patterns() -> Vec<String> {
    vec![
        r"(^|/)tests?/".to_string(),
        r"(^|/)__mocks__/".to_string(),
        r"\.mock\.[a-z0-9]+$".to_string(),
        r"_test\.[a-z0-9]+$".to_string(),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace_root: default_workspace_root(),
            workflow_dir_name: default_workflow_dir_name(),
            tasks_filename: default_tasks_filename(),
            poll_interval_s: default_poll_interval_s(),
            log_tail_bytes: default_log_tail_bytes(),
            min_terminal_cols: default_min_terminal_cols(),
            min_terminal_rows: default_min_terminal_rows(),
            retry: RetryConfig::default(),
            commit_gate_enabled: true,
            three_phase_enabled: true,
            completion: CompletionConfig::default(),
            no_commit_limit: default_no_commit_limit(),
            provider_config_overrides: BTreeMap::new(),
            mock_only_path_patterns: default_mock_only_path_patterns(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file. A missing file is not an
    /// error; it yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Stable hex digest of the behavior-relevant fields.
    ///
    /// Restored runner records whose hash differs from the current
    /// config are treated as stopped rather than re-adopted.
    pub fn config_hash(&self) -> String {
        #[derive(Serialize)]
        struct Relevant<'a> {
            retry: &'a RetryConfig,
            completion: &'a CompletionConfig,
            commit_gate_enabled: bool,
            three_phase_enabled: bool,
            no_commit_limit: u32,
            provider_config_overrides: &'a BTreeMap<String, toml::Value>,
            mock_only_path_patterns: &'a [String],
        }
        let relevant = Relevant {
            retry: &self.retry,
            completion: &self.completion,
            commit_gate_enabled: self.commit_gate_enabled,
            three_phase_enabled: self.three_phase_enabled,
            no_commit_limit: self.no_commit_limit,
            provider_config_overrides: &self.provider_config_overrides,
            mock_only_path_patterns: &self.mock_only_path_patterns,
        };
        let json = serde_json::to_string(&relevant).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        hex_string(&hasher.finalize())
    }

    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.poll_interval_s)
    }
}

fn hex_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        use std::fmt::Write;
        let _ = write!(out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
