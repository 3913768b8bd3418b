// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::completion::CompletionTunables;
use std::process::Command as StdCommand;
use sw_adapters::{FakeProbe, FakeProvider, FakeRescue, ProbeReply, ProbeStatus};
use sw_core::{FakeClock, RetryPolicy};

const WORKFLOW: &str = ".spec-workflow";

struct Fixture {
    _project_dir: tempfile::TempDir,
    _state_dir: tempfile::TempDir,
    project: Project,
    spec: Spec,
    manager: Arc<RunnerManager<FakeClock>>,
    config: Config,
    probe: FakeProbe,
    rescue: FakeRescue,
}

fn sh(dir: &std::path::Path, cmd: &str) {
    let status = StdCommand::new("sh")
        .arg("-c")
        .arg(cmd)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "command failed: {}", cmd);
}

fn fixture(tasks: &str) -> Fixture {
    let project_dir = tempfile::tempdir().unwrap();
    let state_dir = tempfile::tempdir().unwrap();
    let root = project_dir.path();

    sh(root, "git init -q -b main");
    sh(root, "git config user.email t@example.com");
    sh(root, "git config user.name t");
    std::fs::write(root.join(".gitignore"), ".spec-workflow/\n").unwrap();
    sh(root, "git add .gitignore && git commit -q -m init");

    let project = Project::new(root, WORKFLOW);
    let spec = Spec::new(&project, "auth", "tasks.md");
    std::fs::create_dir_all(spec.tasks_path.parent().unwrap()).unwrap();
    std::fs::write(&spec.tasks_path, tasks).unwrap();

    let mut config = Config::default();
    config.workspace_root = root.to_path_buf();
    config.completion.max_probes = 1;
    config.completion.probe_interval_s = 0.0;
    config.completion.probe_timeout_s = 1.0;
    config.no_commit_limit = 3;

    let manager = Arc::new(RunnerManager::with_clock(
        state_dir.path().join("runner_state.json"),
        RetryPolicy::new(config.retry.clone()),
        config.config_hash(),
        FakeClock::new(),
    ));

    Fixture {
        _project_dir: project_dir,
        _state_dir: state_dir,
        project,
        spec,
        manager,
        config,
        probe: FakeProbe::new(),
        rescue: FakeRescue::failing(),
    }
}

fn driver(fx: &Fixture, provider: FakeProvider) -> IterationDriver<FakeClock> {
    let checker = SmartCompletionChecker::new(
        CompletionTunables::from(&fx.config.completion),
        Arc::new(fx.probe.clone()),
        Arc::new(fx.rescue.clone()),
    );
    IterationDriver::new(
        fx.config.clone(),
        Arc::clone(&fx.manager),
        checker,
        Arc::new(provider),
        None,
        ActivityLog::new(fx.spec.log_dir.join("activity.log")),
    )
    .unwrap()
}

fn no_cancel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    std::mem::forget(tx);
    rx
}

const TWO_TASKS: &str = "\
- [ ] 1. Add foo
  - **Files**:
    - src/foo.txt
- [ ] 2. Add bar
  - **Files**:
    - src/bar.txt
";

/// A session that implements both tasks, commits, and checks them off.
const IMPLEMENT_BOTH: &str = "\
mkdir -p src && echo foo > src/foo.txt && echo bar > src/bar.txt && \
git add src && git commit -q -m 'add foo' && \
git commit -q --allow-empty -m 'add bar' && \
sed -i 's/- \\[ \\]/- [x]/' .spec-workflow/specs/auth/tasks.md";

#[tokio::test]
async fn clean_completion_runs_to_done() {
    let fx = fixture(TWO_TASKS);
    let driver = driver(&fx, FakeProvider::with_script(IMPLEMENT_BOTH));

    let summary = driver
        .run(&fx.project, &fx.spec, no_cancel())
        .await
        .unwrap();

    assert_eq!(summary.outcome, DriveOutcome::Done);
    assert_eq!(summary.iterations, 2, "second iteration sees the spec done");
    assert_eq!(summary.final_stats.completed, 2);
    assert_eq!(summary.final_stats.total, 2);

    let completion = summary.last_completion.unwrap();
    assert_eq!(completion.status, CompletionStatus::CommitsCreated);
    assert_eq!(completion.new_commits, 2);

    // The gate is gone once the drive finishes
    assert!(!fx.project.path.join(".git/hooks/pre-commit").exists());
}

#[tokio::test]
async fn session_commits_pass_the_gate_during_phase_two() {
    let fx = fixture(TWO_TASKS);
    let driver = driver(&fx, FakeProvider::with_script(IMPLEMENT_BOTH));
    // IMPLEMENT_BOTH commits without --no-verify while the gate is
    // installed; if the bypass did not work the run would stall
    let summary = driver
        .run(&fx.project, &fx.spec, no_cancel())
        .await
        .unwrap();
    assert_eq!(summary.outcome, DriveOutcome::Done);
}

#[tokio::test]
async fn pre_existing_hook_survives_the_drive() {
    let fx = fixture(TWO_TASKS);
    let hook_path = fx.project.path.join(".git/hooks/pre-commit");
    std::fs::create_dir_all(hook_path.parent().unwrap()).unwrap();
    let original = "#!/bin/sh\nexec my-linter\n";
    std::fs::write(&hook_path, original).unwrap();

    let driver = driver(&fx, FakeProvider::with_script(IMPLEMENT_BOTH));
    driver
        .run(&fx.project, &fx.spec, no_cancel())
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&hook_path).unwrap(), original);
}

#[tokio::test]
async fn no_progress_iterations_stall_the_driver() {
    let fx = fixture("- [ ] 1. Never done\n");
    let driver = driver(&fx, FakeProvider::succeeding());

    let err = driver
        .run(&fx.project, &fx.spec, no_cancel())
        .await
        .unwrap_err();
    match err {
        EngineError::Stalled { streak } => assert_eq!(streak, 3),
        other => panic!("expected stall, got {:?}", other),
    }
    // Stall cleanup drops the spec's runner records
    assert!(fx.manager.list_active().is_empty());
}

#[tokio::test]
async fn parse_errors_abort_with_task_format_invalid() {
    let fx = fixture("- [?] 1. Broken mark\n");
    let driver = driver(&fx, FakeProvider::succeeding());

    let err = driver
        .run(&fx.project, &fx.spec, no_cancel())
        .await
        .unwrap_err();
    assert_eq!(err.classifier(), "task-format-invalid");
}

#[tokio::test]
async fn dirty_tree_surfaces_as_precondition_failure() {
    let fx = fixture("- [ ] 1. Todo\n");
    std::fs::write(fx.project.path.join("untracked.txt"), "x").unwrap();

    let driver = driver(&fx, FakeProvider::succeeding());
    let err = driver
        .run(&fx.project, &fx.spec, no_cancel())
        .await
        .unwrap_err();
    assert_eq!(err.classifier(), "precondition-failed");
    // The gate never leaks when the start fails
    assert!(!fx.project.path.join(".git/hooks/pre-commit").exists());
}

#[tokio::test]
async fn phase1_resets_falsely_completed_tasks() {
    let fx = fixture(
        "- [x] 2 Implement repo\n  - **Files**:\n    - src/foo.ts\n- [ ] 3. Next\n",
    );
    let driver = driver(&fx, FakeProvider::succeeding());

    let outcome = driver.phase1(&fx.project, &fx.spec, 1).unwrap();
    assert!(matches!(outcome, Phase1Outcome::Ready(_)));

    let text = std::fs::read_to_string(&fx.spec.tasks_path).unwrap();
    assert!(text.contains("- [-] 2 Implement repo"));

    // Phase 1 is idempotent on disk: a second pass changes nothing
    let before = std::fs::read_to_string(&fx.spec.tasks_path).unwrap();
    driver.phase1(&fx.project, &fx.spec, 2).unwrap();
    assert_eq!(std::fs::read_to_string(&fx.spec.tasks_path).unwrap(), before);

    // The validation log landed
    assert!(fx.spec.phase_log_path("validation", 1).exists());
}

#[tokio::test]
async fn phase3_promotes_once_implementation_exists() {
    let fx = fixture(
        "- [-] 2 Implement repo\n  - **Files**:\n    - src/foo.ts\n  - **Acceptance**:\n    - [x] reviewed\n",
    );
    std::fs::create_dir_all(fx.project.path.join("src")).unwrap();
    std::fs::write(fx.project.path.join("src/foo.ts"), "export {}").unwrap();

    fx.probe.push(ProbeReply::with_status(ProbeStatus::Complete));
    let driver = driver(&fx, FakeProvider::succeeding());
    let baseline = sw_probes::git_head(&fx.project.path).await.unwrap();

    let report = driver
        .phase3(&fx.project, &fx.spec, 1, &baseline, &mut no_cancel())
        .await
        .unwrap();
    assert_eq!(report.promoted, vec!["2"]);
    assert_eq!(report.stats.completed, 1);

    let text = std::fs::read_to_string(&fx.spec.tasks_path).unwrap();
    assert!(text.contains("- [x] 2 Implement repo"));
    assert!(fx.spec.phase_log_path("verification", 1).exists());
}

#[tokio::test]
async fn dry_run_reports_without_mutating() {
    let fx = fixture("- [x] 1. No files declared\n");
    let driver = driver(&fx, FakeProvider::succeeding());

    let before = std::fs::read_to_string(&fx.spec.tasks_path).unwrap();
    let (stats, issues) = driver.dry_run(&fx.project, &fx.spec).unwrap();

    // The falsely-completed task counts as in-progress after the
    // simulated reset, but the file is untouched
    assert_eq!(stats.in_progress, 1);
    assert!(issues
        .iter()
        .any(|i| i.kind == sw_taskdoc::IssueKind::CompletedWithoutFiles));
    assert_eq!(std::fs::read_to_string(&fx.spec.tasks_path).unwrap(), before);
}

#[tokio::test]
async fn legacy_mode_uses_commits_as_the_only_signal() {
    let mut fx = fixture(TWO_TASKS);
    fx.config.three_phase_enabled = false;
    let driver = driver(&fx, FakeProvider::with_script(IMPLEMENT_BOTH));

    let summary = driver
        .run(&fx.project, &fx.spec, no_cancel())
        .await
        .unwrap();
    assert_eq!(summary.outcome, DriveOutcome::Done);
    let completion = summary.last_completion.unwrap();
    assert_eq!(completion.status, CompletionStatus::CommitsCreated);
    assert_eq!(completion.probes_used, 0);
}

#[tokio::test]
async fn cancellation_before_the_first_phase_returns_canceled() {
    let fx = fixture("- [ ] 1. Todo\n");
    let driver = driver(&fx, FakeProvider::with_argv(vec!["sleep".into(), "30".into()]));

    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();
    let summary = driver.run(&fx.project, &fx.spec, rx).await.unwrap();
    assert_eq!(summary.outcome, DriveOutcome::Canceled);
}

#[tokio::test]
async fn cancellation_during_phase_two_stops_the_runner() {
    let fx = fixture("- [ ] 1. Todo\n");
    let driver = driver(&fx, FakeProvider::with_argv(vec!["sleep".into(), "30".into()]));

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = tx.send(true);
    });

    let summary = driver.run(&fx.project, &fx.spec, rx).await.unwrap();
    assert_eq!(summary.outcome, DriveOutcome::Canceled);
    assert!(fx.manager.list_active().is_empty());
    // Gate cleanup ran on the cancellation path too
    assert!(!fx.project.path.join(".git/hooks/pre-commit").exists());
}
