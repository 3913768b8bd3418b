// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project and spec locations.
//!
//! A project is any directory carrying the workflow subdirectory; each
//! spec under `<workflow>/specs/<name>/` owns exactly one tasks file and
//! a log directory. Relations are tree-shaped; upward references are by
//! path, never by pointer.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A discovered workspace project, identified by absolute path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub path: PathBuf,
    /// The workflow directory inside the project (e.g. `.spec-workflow`)
    pub workflow_dir: PathBuf,
}

impl Project {
    pub fn new(path: impl Into<PathBuf>, workflow_dir_name: &str) -> Self {
        let path = path.into();
        let workflow_dir = path.join(workflow_dir_name);
        Self { path, workflow_dir }
    }

    pub fn specs_dir(&self) -> PathBuf {
        self.workflow_dir.join("specs")
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// A spec directory within a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    pub name: String,
    pub dir: PathBuf,
    pub tasks_path: PathBuf,
    pub log_dir: PathBuf,
}

impl Spec {
    pub fn new(project: &Project, name: impl Into<String>, tasks_filename: &str) -> Self {
        let name = name.into();
        let dir = project.specs_dir().join(&name);
        let tasks_path = dir.join(tasks_filename);
        let log_dir = project.workflow_dir.join("logs").join(&name);
        Self {
            name,
            dir,
            tasks_path,
            log_dir,
        }
    }

    /// Path for a per-iteration phase log, e.g. `validation_3.log`.
    pub fn phase_log_path(&self, phase: &str, iteration: u32) -> PathBuf {
        self.log_dir.join(format!("{}_{}.log", phase, iteration))
    }

    /// Path for the nth runner log (rotated on retry).
    pub fn runner_log_path(&self, attempt: u32) -> PathBuf {
        self.log_dir.join(format!("runner_{}.log", attempt))
    }
}

/// True when `path` looks like a project root for the given workflow
/// directory name.
pub fn is_project_root(path: &Path, workflow_dir_name: &str) -> bool {
    path.join(workflow_dir_name).is_dir()
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
