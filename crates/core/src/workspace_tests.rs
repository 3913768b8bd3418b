// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn project_paths_derive_from_workflow_dir() {
    let project = Project::new("/work/proj", ".spec-workflow");
    assert_eq!(project.workflow_dir, PathBuf::from("/work/proj/.spec-workflow"));
    assert_eq!(
        project.specs_dir(),
        PathBuf::from("/work/proj/.spec-workflow/specs")
    );
    assert_eq!(project.name(), "proj");
}

#[test]
fn spec_paths_derive_from_project() {
    let project = Project::new("/work/proj", ".spec-workflow");
    let spec = Spec::new(&project, "auth", "tasks.md");
    assert_eq!(
        spec.tasks_path,
        PathBuf::from("/work/proj/.spec-workflow/specs/auth/tasks.md")
    );
    assert_eq!(
        spec.log_dir,
        PathBuf::from("/work/proj/.spec-workflow/logs/auth")
    );
    assert_eq!(
        spec.phase_log_path("validation", 2),
        spec.log_dir.join("validation_2.log")
    );
    assert_eq!(spec.runner_log_path(0), spec.log_dir.join("runner_0.log"));
}

#[test]
fn is_project_root_requires_workflow_dir() {
    let dir = tempfile::tempdir().unwrap();
    assert!(!is_project_root(dir.path(), ".spec-workflow"));
    std::fs::create_dir(dir.path().join(".spec-workflow")).unwrap();
    assert!(is_project_root(dir.path(), ".spec-workflow"));
}
