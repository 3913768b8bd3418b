// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document-level validation on top of the parser.

use crate::parser::{parse, Issue, IssueKind};
use regex::RegexSet;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("invalid mock path pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// Compiled set of mock/test-only path classifiers.
///
/// A completed task whose declared files all match is treated as
/// unimplemented: tests and mocks alone are not an implementation.
#[derive(Debug, Clone)]
pub struct MockPatterns {
    set: RegexSet,
}

impl MockPatterns {
    pub fn new(patterns: &[String]) -> Result<Self, PatternError> {
        Ok(Self {
            set: RegexSet::new(patterns)?,
        })
    }

    // Allow expect here as the default patterns are compile-time verified
    #[allow(clippy::expect_used)]
    pub fn default_set() -> Self {
        Self::new(&sw_core::config::default_mock_only_path_patterns())
            .expect("default mock patterns are valid")
    }

    pub fn is_mock(&self, path: &Path) -> bool {
        self.set.is_match(&path.to_string_lossy())
    }

    /// True when the list is non-empty and every path matches.
    pub fn mock_only<P: AsRef<Path>>(&self, files: &[P]) -> bool {
        !files.is_empty() && files.iter().all(|f| self.is_mock(f.as_ref()))
    }
}

fn id_key(id: &str) -> Vec<u64> {
    id.split('.').filter_map(|c| c.parse().ok()).collect()
}

/// Validate a task document.
///
/// Returns the parser's issues plus document-level findings: duplicate
/// or out-of-order ids, and completed tasks with no (or mock-only)
/// implementation files.
pub fn validate(text: &str, patterns: &MockPatterns) -> Vec<Issue> {
    let doc = parse(text);
    let mut issues = doc.issues.clone();

    let mut seen: HashSet<&str> = HashSet::new();
    let mut prev_key: Option<Vec<u64>> = None;

    for (i, task) in doc.tasks.iter().enumerate() {
        let line = doc.task_line(i).unwrap_or(0);

        if !seen.insert(task.id.as_str()) {
            issues.push(Issue::error(
                line,
                IssueKind::DuplicateId,
                format!("duplicate task id {}", task.id),
            ));
        }

        let key = id_key(&task.id);
        if let Some(prev) = &prev_key {
            if key < *prev {
                issues.push(Issue::warning(
                    line,
                    IssueKind::NonMonotonicId,
                    format!("task id {} is out of order", task.id),
                ));
            }
        }
        prev_key = Some(key);

        if task.status == sw_core::TaskStatus::Completed {
            if task.files.is_empty() {
                issues.push(Issue::error(
                    line,
                    IssueKind::CompletedWithoutFiles,
                    format!("completed task {} declares no files", task.id),
                ));
            } else if patterns.mock_only(&task.files) {
                issues.push(Issue::error(
                    line,
                    IssueKind::CompletedMockOnly,
                    format!("completed task {} declares only mock/test files", task.id),
                ));
            }
        }
    }

    issues.sort_by_key(|i| i.line);
    issues
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
