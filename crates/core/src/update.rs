// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State updates published by the poller.
//!
//! The poller is the single producer; the UI consumer drains these from
//! a bounded channel. `TaskCountsChanged` and `LogAppended` carry the
//! latest value (not a delta stream) and may be coalesced under
//! backpressure; the other variants are never dropped.

use crate::id::ShortId;
use crate::runner::{RunnerId, RunnerStatus};
use crate::task::TaskStats;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

crate::define_id! {
    /// Identifier for a `(project, spec)` pair as tracked by the poller.
    pub struct SpecId;
}

impl SpecId {
    /// Build the canonical id for a spec within a project.
    pub fn for_spec(project_path: &Path, spec_name: &str) -> Self {
        Self::new(format!("{}::{}", project_path.display(), spec_name))
    }
}

/// Events published by the state poller.
///
/// Serializes with `{"type": "scope:name", ...fields}` format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StateUpdate {
    /// The task counts for a spec changed (latest counts, not a delta).
    #[serde(rename = "tasks:counts")]
    TaskCountsChanged { spec_id: SpecId, stats: TaskStats },

    /// New bytes were appended to a spec's runner log.
    #[serde(rename = "log:appended")]
    LogAppended { spec_id: SpecId, tail: String },

    /// The repository HEAD moved since the last poll.
    #[serde(rename = "git:commit")]
    CommitObserved {
        spec_id: SpecId,
        hash: String,
        subject: String,
    },

    /// A supervised runner changed status.
    #[serde(rename = "runner:status")]
    RunnerStatusChanged {
        runner_id: RunnerId,
        status: RunnerStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
    },

    /// The discovered project set changed.
    #[serde(rename = "projects:changed")]
    ProjectSetChanged { projects: Vec<PathBuf> },
}

impl StateUpdate {
    pub fn name(&self) -> &'static str {
        match self {
            StateUpdate::TaskCountsChanged { .. } => "tasks:counts",
            StateUpdate::LogAppended { .. } => "log:appended",
            StateUpdate::CommitObserved { .. } => "git:commit",
            StateUpdate::RunnerStatusChanged { .. } => "runner:status",
            StateUpdate::ProjectSetChanged { .. } => "projects:changed",
        }
    }

    /// Updates that may be replaced by a newer one for the same spec
    /// when the channel is full.
    pub fn is_coalescable(&self) -> bool {
        matches!(
            self,
            StateUpdate::TaskCountsChanged { .. } | StateUpdate::LogAppended { .. }
        )
    }

    /// Key identifying which older update a coalescable one supersedes.
    pub fn coalesce_key(&self) -> Option<(&'static str, &SpecId)> {
        match self {
            StateUpdate::TaskCountsChanged { spec_id, .. } => Some(("tasks:counts", spec_id)),
            StateUpdate::LogAppended { spec_id, .. } => Some(("log:appended", spec_id)),
            _ => None,
        }
    }

    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            StateUpdate::TaskCountsChanged { spec_id, stats } => {
                format!("{t} spec={spec_id} {stats}")
            }
            StateUpdate::LogAppended { spec_id, tail } => {
                format!("{t} spec={spec_id} bytes={}", tail.len())
            }
            StateUpdate::CommitObserved { spec_id, hash, .. } => {
                format!("{t} spec={spec_id} hash={}", hash.short(12))
            }
            StateUpdate::RunnerStatusChanged {
                runner_id,
                status,
                exit_code,
            } => match exit_code {
                Some(code) => format!("{t} runner={runner_id} status={status} exit={code}"),
                None => format!("{t} runner={runner_id} status={status}"),
            },
            StateUpdate::ProjectSetChanged { projects } => {
                format!("{t} count={}", projects.len())
            }
        }
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
