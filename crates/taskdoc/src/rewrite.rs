// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Byte-preserving checkbox rewrites.
//!
//! Both operations only ever replace the bracket content of the task
//! lines they change; every other byte of the document passes through
//! untouched, so the subprocess's own formatting survives. Both are
//! idempotent and deterministic for a given document and filesystem.

use crate::parser::{parse, MarkSite};
use crate::validate::MockPatterns;
use crate::FileProbe;
use sw_core::{Task, TaskStatus};

/// Result of a `reset_unimplemented` rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetOutcome {
    pub text: String,
    /// Ids of tasks demoted from completed to in-progress
    pub reset_ids: Vec<String>,
}

impl ResetOutcome {
    pub fn changed(&self) -> bool {
        !self.reset_ids.is_empty()
    }
}

/// Result of a `promote_implemented` rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromoteOutcome {
    pub text: String,
    /// Ids of tasks promoted from in-progress to completed
    pub promoted_ids: Vec<String>,
}

impl PromoteOutcome {
    pub fn changed(&self) -> bool {
        !self.promoted_ids.is_empty()
    }
}

fn needs_reset(task: &Task, probe: &dyn FileProbe, patterns: &MockPatterns) -> bool {
    if task.status != TaskStatus::Completed {
        return false;
    }
    if task.files.is_empty() {
        return true;
    }
    let real: Vec<_> = task
        .files
        .iter()
        .filter(|f| !patterns.is_mock(f))
        .collect();
    if real.is_empty() {
        return true;
    }
    real.into_iter().any(|f| !probe.exists(f))
}

fn ready_to_promote(task: &Task, probe: &dyn FileProbe, patterns: &MockPatterns) -> bool {
    task.status == TaskStatus::InProgress
        && !task.files.is_empty()
        && !patterns.mock_only(&task.files)
        && task.files.iter().all(|f| probe.exists(f))
        && task.acceptance_met()
}

/// Demote every `- [x]` task whose declared implementation is absent
/// (files missing, undeclared, or mock/test-only) back to `- [-]`.
pub fn reset_unimplemented(
    text: &str,
    probe: &dyn FileProbe,
    patterns: &MockPatterns,
) -> ResetOutcome {
    let doc = parse(text);
    let mut edits: Vec<(MarkSite, char)> = Vec::new();
    let mut reset_ids = Vec::new();

    for (task, site) in doc.tasks.iter().zip(&doc.sites) {
        if needs_reset(task, probe, patterns) {
            edits.push((*site, TaskStatus::InProgress.mark()));
            reset_ids.push(task.id.clone());
        }
    }

    ResetOutcome {
        text: apply_marks(text, &edits),
        reset_ids,
    }
}

/// Promote every `- [-]` task whose declared files all exist, are not
/// purely mocks/tests, and whose acceptance boxes are all checked.
pub fn promote_implemented(
    text: &str,
    probe: &dyn FileProbe,
    patterns: &MockPatterns,
) -> PromoteOutcome {
    let doc = parse(text);
    let mut edits: Vec<(MarkSite, char)> = Vec::new();
    let mut promoted_ids = Vec::new();

    for (task, site) in doc.tasks.iter().zip(&doc.sites) {
        if ready_to_promote(task, probe, patterns) {
            edits.push((*site, TaskStatus::Completed.mark()));
            promoted_ids.push(task.id.clone());
        }
    }

    PromoteOutcome {
        text: apply_marks(text, &edits),
        promoted_ids,
    }
}

/// Replace the bracket content at each site with a single mark char.
fn apply_marks(text: &str, edits: &[(MarkSite, char)]) -> String {
    if edits.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    for (idx, line) in text.split_inclusive('\n').enumerate() {
        match edits.iter().find(|(site, _)| site.line == idx) {
            Some((site, mark)) => {
                out.push_str(&line[..site.inner_start]);
                out.push(*mark);
                out.push_str(&line[site.inner_start + site.inner_len..]);
            }
            None => out.push_str(line),
        }
    }
    out
}

#[cfg(test)]
#[path = "rewrite_tests.rs"]
mod tests;
