// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task checklist model.
//!
//! A task is one checkbox line in a spec's `tasks.md`, plus the indented
//! `Files:` and `Acceptance:` sub-records attached to it. The document on
//! disk is the ground truth; these types are a parsed view of it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Status of a single task, as read from its checkbox mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// `- [ ]` — not started
    Pending,
    /// `- [-]` — started, not finished
    InProgress,
    /// `- [x]` — claimed complete
    Completed,
}

impl TaskStatus {
    /// The checkbox mark character for this status.
    pub fn mark(&self) -> char {
        match self {
            TaskStatus::Pending => ' ',
            TaskStatus::InProgress => '-',
            TaskStatus::Completed => 'x',
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

/// One sub-checkbox under a task's `Acceptance:` heading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceItem {
    pub status: TaskStatus,
    pub text: String,
}

impl AcceptanceItem {
    pub fn is_checked(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// A task parsed from a single top-level checkbox line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Dotted numeric identifier, e.g. `"4.2.1"`. Unique within a document.
    pub id: String,
    pub status: TaskStatus,
    pub title: String,
    /// Workspace-relative paths declared under the task's `Files:` heading.
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Sub-checkboxes under the task's `Acceptance:` heading.
    #[serde(default)]
    pub acceptance: Vec<AcceptanceItem>,
}

impl Task {
    /// True when every acceptance sub-checkbox is checked (vacuously true
    /// for a task with no acceptance section).
    pub fn acceptance_met(&self) -> bool {
        self.acceptance.iter().all(AcceptanceItem::is_checked)
    }
}

/// Counts of tasks by status. `total` always equals the sum of the parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub total: usize,
}

impl TaskStats {
    /// Count tasks by status.
    pub fn count(tasks: &[Task]) -> Self {
        let mut stats = TaskStats::default();
        for task in tasks {
            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::InProgress => stats.in_progress += 1,
                TaskStatus::Completed => stats.completed += 1,
            }
            stats.total += 1;
        }
        stats
    }

    /// True when there is nothing left to do (including the empty document).
    pub fn all_done(&self) -> bool {
        self.completed == self.total
    }

    /// True when at least one task is pending or in progress.
    pub fn has_actionable(&self) -> bool {
        self.pending + self.in_progress > 0
    }
}

impl fmt::Display for TaskStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} done ({} pending, {} in progress)",
            self.completed, self.total, self.pending, self.in_progress
        )
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
