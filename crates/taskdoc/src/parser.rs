// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-pass parser for the checkbox task grammar.
//!
//! ```text
//! - [ ] 1. Set up project
//!   - **Files**:
//!     - src/main.rs
//!   - **Acceptance**:
//!     - [x] compiles
//! - [-] 2.1 Wire up config
//! ```
//!
//! A task line is a top-level `- [mark] id title`; everything indented
//! beneath it up to the next task line belongs to it. Unknown indented
//! content is preserved verbatim by rewrites and ignored here.

use regex::Regex;
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;
use sw_core::{AcceptanceItem, Task, TaskStats, TaskStatus};

// Allow expect here as the regexes are compile-time verified to be valid
#[allow(clippy::expect_used)]
static TASK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^- \[([^\]]*)\]\s+(\d+(?:\.\d+)*)[.)]?\s+(\S.*)$")
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static BARE_NUMBERED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^- (\d+(?:\.\d+)*)[.)]?\s+\S").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static ACCEPT_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^- \[([^\]]*)\]\s*(.*)$").expect("constant regex pattern is valid")
});

/// Issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// What kind of problem an [`Issue`] reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Numbered task line without a checkbox
    MissingCheckbox,
    /// Checkbox mark other than ` `, `-`, or `x`
    InvalidMark,
    DuplicateId,
    NonMonotonicId,
    /// `- [x]` task with no `Files:` declarations
    CompletedWithoutFiles,
    /// `- [x]` task whose declared files are all mock/test-only
    CompletedMockOnly,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueKind::MissingCheckbox => write!(f, "missing_checkbox"),
            IssueKind::InvalidMark => write!(f, "invalid_mark"),
            IssueKind::DuplicateId => write!(f, "duplicate_id"),
            IssueKind::NonMonotonicId => write!(f, "non_monotonic_id"),
            IssueKind::CompletedWithoutFiles => write!(f, "completed_without_files"),
            IssueKind::CompletedMockOnly => write!(f, "completed_mock_only"),
        }
    }
}

/// A single validation finding. Issues are data, never faults: parsing
/// continues past every one of them.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Issue {
    /// 1-based line number in the document
    pub line: usize,
    pub severity: Severity,
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub(crate) fn error(line: usize, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            line,
            severity: Severity::Error,
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn warning(line: usize, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            line,
            severity: Severity::Warning,
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: {} [{}] {}",
            self.line, self.severity, self.kind, self.message
        )
    }
}

/// Where a task's checkbox mark sits in the source text, for
/// byte-preserving rewrites. `inner` spans the bracket content, which
/// may include whitespace padding (`[ x ]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MarkSite {
    /// 0-based line index
    pub line: usize,
    /// Byte offset of the bracket content within the line
    pub inner_start: usize,
    pub inner_len: usize,
}

/// Result of parsing a task document.
#[derive(Debug, Clone)]
pub struct ParsedDoc {
    pub tasks: Vec<Task>,
    pub issues: Vec<Issue>,
    /// Mark locations, parallel to `tasks`
    pub(crate) sites: Vec<MarkSite>,
}

impl ParsedDoc {
    pub fn stats(&self) -> TaskStats {
        TaskStats::count(&self.tasks)
    }

    /// 1-based source line of the task at `index`.
    pub fn task_line(&self, index: usize) -> Option<usize> {
        self.sites.get(index).map(|s| s.line + 1)
    }

    /// True when any issue has error severity.
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }
}

fn parse_mark(inner: &str) -> Option<TaskStatus> {
    match inner.trim() {
        "" => Some(TaskStatus::Pending),
        "-" => Some(TaskStatus::InProgress),
        "x" | "X" => Some(TaskStatus::Completed),
        _ => None,
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    None,
    Files,
    Acceptance,
}

/// Parse a task document. Pure; one pass; never fails.
pub fn parse(text: &str) -> ParsedDoc {
    let mut tasks: Vec<Task> = Vec::new();
    let mut sites: Vec<MarkSite> = Vec::new();
    let mut issues: Vec<Issue> = Vec::new();
    let mut section = Section::None;

    for (idx, line) in text.lines().enumerate() {
        let lineno = idx + 1;

        if !line.starts_with(' ') && !line.starts_with('\t') {
            section = Section::None;

            if let Some(caps) = TASK_LINE.captures(line) {
                let inner = match caps.get(1) {
                    Some(m) => m,
                    None => continue,
                };
                match parse_mark(inner.as_str()) {
                    Some(status) => {
                        tasks.push(Task {
                            id: caps[2].to_string(),
                            status,
                            title: caps[3].trim_end().to_string(),
                            files: Vec::new(),
                            acceptance: Vec::new(),
                        });
                        sites.push(MarkSite {
                            line: idx,
                            inner_start: inner.start(),
                            inner_len: inner.len(),
                        });
                    }
                    None => {
                        issues.push(Issue::error(
                            lineno,
                            IssueKind::InvalidMark,
                            format!("invalid checkbox mark {:?}", inner.as_str()),
                        ));
                    }
                }
            } else if line.starts_with("- [") {
                // Checkbox without a numeric id: ordinary markdown, not a task
            } else if BARE_NUMBERED.is_match(line) {
                issues.push(Issue::error(
                    lineno,
                    IssueKind::MissingCheckbox,
                    "numbered task line has no checkbox",
                ));
            }
            continue;
        }

        // Indented continuation of the most recent task
        let trimmed = line.trim_start();
        let Some(task) = tasks.last_mut() else {
            continue;
        };

        if trimmed.starts_with("- **Files**:") {
            section = Section::Files;
            continue;
        }
        if trimmed.starts_with("- **Acceptance**:") {
            section = Section::Acceptance;
            continue;
        }

        match section {
            Section::Files => {
                if let Some(rest) = trimmed.strip_prefix("- ") {
                    if !rest.starts_with('[') && !rest.starts_with("**") {
                        task.files.push(PathBuf::from(rest.trim()));
                    }
                }
            }
            Section::Acceptance => {
                if let Some(caps) = ACCEPT_ITEM.captures(trimmed) {
                    match parse_mark(&caps[1]) {
                        Some(status) => task.acceptance.push(AcceptanceItem {
                            status,
                            text: caps[2].trim_end().to_string(),
                        }),
                        None => issues.push(Issue::error(
                            lineno,
                            IssueKind::InvalidMark,
                            format!("invalid acceptance mark {:?}", &caps[1]),
                        )),
                    }
                }
            }
            // Unknown indented content: preserved verbatim, ignored here
            Section::None => {}
        }
    }

    ParsedDoc {
        tasks,
        issues,
        sites,
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
