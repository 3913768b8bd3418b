// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outcome of a smart completion check.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a completion check concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    /// New commits landed past the baseline
    CommitsCreated,
    /// Uncommitted work was rescued into a commit mid-check
    Rescued,
    /// Rescue succeeded only on the final attempt after probes ran out
    RescuedFinal,
    /// Session reported complete with a clean tree and no commits
    NothingToDo,
    /// Probe budget exhausted with no evidence of progress
    Timeout,
    /// Probes kept failing or returning malformed replies
    ProbeError,
    /// Session asked not to be continued
    LlmStopped,
}

impl CompletionStatus {
    /// Statuses that count as real progress for stall tracking.
    pub fn is_progress(&self) -> bool {
        matches!(
            self,
            CompletionStatus::CommitsCreated
                | CompletionStatus::Rescued
                | CompletionStatus::RescuedFinal
        )
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionStatus::CommitsCreated => write!(f, "commits_created"),
            CompletionStatus::Rescued => write!(f, "rescued"),
            CompletionStatus::RescuedFinal => write!(f, "rescued_final"),
            CompletionStatus::NothingToDo => write!(f, "nothing_to_do"),
            CompletionStatus::Timeout => write!(f, "timeout"),
            CompletionStatus::ProbeError => write!(f, "probe_error"),
            CompletionStatus::LlmStopped => write!(f, "llm_stopped"),
        }
    }
}

/// Result of one smart completion check over an iteration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub complete: bool,
    pub new_commits: u64,
    pub probes_used: u32,
    pub rescued: bool,
    pub status: CompletionStatus,
}

impl CompletionResult {
    pub fn commits_created(new_commits: u64) -> Self {
        Self {
            complete: true,
            new_commits,
            probes_used: 0,
            rescued: false,
            status: CompletionStatus::CommitsCreated,
        }
    }

    pub fn rescued(new_commits: u64, probes_used: u32, final_attempt: bool) -> Self {
        Self {
            complete: true,
            new_commits,
            probes_used,
            rescued: true,
            status: if final_attempt {
                CompletionStatus::RescuedFinal
            } else {
                CompletionStatus::Rescued
            },
        }
    }

    pub fn without_progress(status: CompletionStatus, probes_used: u32) -> Self {
        Self {
            complete: false,
            new_commits: 0,
            probes_used,
            rescued: false,
            status,
        }
    }
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
