// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace discovery scan.
//!
//! Cheap enough to run every poll cycle: one directory listing of the
//! workspace root plus a stat per candidate. A project is any directory
//! carrying the workflow subdirectory; the root itself may be one.

use std::path::Path;
use sw_core::workspace::{is_project_root, Project, Spec};

/// Find projects under `root`: the root itself and its direct children.
///
/// Hidden directories are skipped. Results are sorted by path so the
/// poller can diff consecutive scans.
pub fn discover_projects(root: &Path, workflow_dir_name: &str) -> std::io::Result<Vec<Project>> {
    let mut projects = Vec::new();

    if is_project_root(root, workflow_dir_name) {
        projects.push(Project::new(root, workflow_dir_name));
    }

    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(projects),
        Err(e) => return Err(e),
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        if is_project_root(&path, workflow_dir_name) {
            projects.push(Project::new(path, workflow_dir_name));
        }
    }

    projects.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(projects)
}

/// List the specs of a project that actually carry a tasks file.
pub fn list_specs(project: &Project, tasks_filename: &str) -> std::io::Result<Vec<Spec>> {
    let specs_dir = project.specs_dir();
    let mut specs = Vec::new();

    let entries = match std::fs::read_dir(&specs_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(specs),
        Err(e) => return Err(e),
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let spec = Spec::new(project, name, tasks_filename);
        if spec.tasks_path.is_file() {
            specs.push(spec);
        }
    }

    specs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(specs)
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
