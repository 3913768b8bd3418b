// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner identifier and durable record types.
//!
//! A runner is one supervised AI subprocess working a spec. The record is
//! the durable handle: it survives host restarts via the runner state
//! file and carries everything needed to re-adopt or discard the process
//! (`pid` + `cmd_fingerprint` guard against PID reuse).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a supervised runner (UUID in production).
    pub struct RunnerId;
}

/// Lifecycle status of a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunnerStatus {
    /// Record created, child not yet observed running
    Starting,
    /// Child process alive
    Running,
    /// Child exited with status 0
    Completed,
    /// Stopped on request
    Stopped,
    /// Child exited nonzero, spawn failed, or process vanished
    Crashed,
}

impl RunnerStatus {
    /// Terminal states never transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunnerStatus::Completed | RunnerStatus::Stopped | RunnerStatus::Crashed
        )
    }
}

impl fmt::Display for RunnerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunnerStatus::Starting => write!(f, "starting"),
            RunnerStatus::Running => write!(f, "running"),
            RunnerStatus::Completed => write!(f, "completed"),
            RunnerStatus::Stopped => write!(f, "stopped"),
            RunnerStatus::Crashed => write!(f, "crashed"),
        }
    }
}

/// Durable handle for a supervised subprocess.
///
/// Serialized into the per-host runner state file (see `sw-storage`);
/// field names are the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerRecord {
    pub id: RunnerId,
    pub project_path: PathBuf,
    pub spec_name: String,
    pub provider: String,
    pub model: String,
    pub pid: u32,
    /// Stable substring of the child's argv, matched together with the
    /// pid on liveness checks.
    pub cmd_fingerprint: String,
    pub status: RunnerStatus,
    pub start_time: DateTime<Utc>,
    pub last_activity_time: DateTime<Utc>,
    #[serde(default)]
    pub last_retry_time: Option<DateTime<Utc>>,
    pub retry_count: u32,
    pub max_retries: u32,
    pub config_hash: String,
    pub log_path: PathBuf,
    #[serde(default)]
    pub baseline_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

impl RunnerRecord {
    /// True when this record claims the given `(project, spec)` pair.
    pub fn is_for(&self, project_path: &std::path::Path, spec_name: &str) -> bool {
        self.project_path == project_path && self.spec_name == spec_name
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_time = now;
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
