// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture for end-to-end engine specs.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use sw_adapters::{FakeProbe, FakeProvider, FakeRescue};
use sw_core::{Config, FakeClock, Project, RetryPolicy, Spec};
use sw_engine::{ActivityLog, CompletionTunables, IterationDriver, RunnerManager, SmartCompletionChecker};

pub const WORKFLOW: &str = ".spec-workflow";

pub struct World {
    pub _project_dir: tempfile::TempDir,
    pub state_dir: tempfile::TempDir,
    pub project: Project,
    pub spec: Spec,
    pub config: Config,
    pub manager: Arc<RunnerManager<FakeClock>>,
    pub probe: FakeProbe,
    pub rescue: FakeRescue,
}

pub fn sh(dir: &Path, cmd: &str) {
    let status = Command::new("sh")
        .arg("-c")
        .arg(cmd)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "command failed: {}", cmd);
}

pub fn world(tasks: &str) -> World {
    let project_dir = tempfile::tempdir().unwrap();
    let state_dir = tempfile::tempdir().unwrap();
    let root = project_dir.path();

    sh(root, "git init -q -b main");
    sh(root, "git config user.email spec@example.com");
    sh(root, "git config user.name spec");
    std::fs::write(root.join(".gitignore"), format!("{}/\n", WORKFLOW)).unwrap();
    sh(root, "git add .gitignore && git commit -q -m init");

    let project = Project::new(root, WORKFLOW);
    let spec = Spec::new(&project, "demo", "tasks.md");
    std::fs::create_dir_all(spec.tasks_path.parent().unwrap()).unwrap();
    std::fs::write(&spec.tasks_path, tasks).unwrap();

    let mut config = Config::default();
    config.workspace_root = root.to_path_buf();
    config.completion.max_probes = 2;
    config.completion.probe_interval_s = 0.0;
    config.completion.probe_timeout_s = 2.0;

    let manager = Arc::new(RunnerManager::with_clock(
        state_dir.path().join("runner_state.json"),
        RetryPolicy::new(config.retry.clone()),
        config.config_hash(),
        FakeClock::new(),
    ));

    World {
        _project_dir: project_dir,
        state_dir,
        project,
        spec,
        config,
        manager,
        probe: FakeProbe::new(),
        rescue: FakeRescue::failing(),
    }
}

pub fn driver(world: &World, provider: FakeProvider) -> IterationDriver<FakeClock> {
    let checker = SmartCompletionChecker::new(
        CompletionTunables::from(&world.config.completion),
        Arc::new(world.probe.clone()),
        Arc::new(world.rescue.clone()),
    );
    IterationDriver::new(
        world.config.clone(),
        Arc::clone(&world.manager),
        checker,
        Arc::new(provider),
        None,
        ActivityLog::new(world.state_dir.path().join("activity.log")),
    )
    .unwrap()
}

pub fn no_cancel() -> tokio::sync::watch::Receiver<bool> {
    let (tx, rx) = tokio::sync::watch::channel(false);
    std::mem::forget(tx);
    rx
}
