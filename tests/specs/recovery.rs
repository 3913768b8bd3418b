// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash-recovery scenarios: restart restore and gate cleanup.

use crate::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use sw_adapters::FakeProvider;
use sw_core::{FakeClock, RetryPolicy, RunnerStatus};
use sw_engine::{commit_gate, RunnerManager};
use sw_storage::RunnerStateFile;

/// A runner started before a "host restart" is re-adopted by a fresh
/// manager as long as its process is alive under the same config.
#[tokio::test]
async fn restart_restores_live_runners() {
    let w = world("- [ ] 1. Long running\n");
    let state_path = w.state_dir.path().join("runner_state.json");

    let record = w
        .manager
        .start(
            &w.project,
            &w.spec,
            &FakeProvider::with_argv(vec!["sleep".into(), "30".into()]),
            "go",
            &Default::default(),
        )
        .await
        .unwrap();

    // "Restart": a brand-new manager reads the persisted state
    let persisted = RunnerStateFile::load(&state_path).unwrap();
    assert_eq!(persisted.runners.len(), 1);

    let fresh = Arc::new(RunnerManager::with_clock(
        state_path.clone(),
        RetryPolicy::new(w.config.retry.clone()),
        w.config.config_hash(),
        FakeClock::new(),
    ));
    let dropped = fresh.restore(persisted.runners);
    assert!(dropped.is_empty());

    let active = fresh.list_active();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, record.id);
    assert_eq!(active[0].status, RunnerStatus::Running);

    // The adopted runner can still be stopped
    let stopped = fresh
        .stop(&record.id, Duration::from_secs(3))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stopped.status, RunnerStatus::Stopped);
}

/// A config change between restarts drops the record instead of
/// re-adopting a runner started under different settings.
#[tokio::test]
async fn restart_drops_runners_from_a_different_config() {
    let w = world("- [ ] 1. Long running\n");
    let state_path = w.state_dir.path().join("runner_state.json");

    let record = w
        .manager
        .start(
            &w.project,
            &w.spec,
            &FakeProvider::with_argv(vec!["sleep".into(), "30".into()]),
            "go",
            &Default::default(),
        )
        .await
        .unwrap();

    let fresh = RunnerManager::with_clock(
        state_path.clone(),
        RetryPolicy::default(),
        "a-different-config-hash".to_string(),
        FakeClock::new(),
    );
    let persisted = RunnerStateFile::load(&state_path).unwrap();
    let dropped = fresh.restore(persisted.runners);
    assert_eq!(dropped.len(), 1);
    assert!(fresh.list_active().is_empty());

    // Clean up the orphan
    w.manager
        .stop(&record.id, Duration::from_secs(3))
        .await
        .unwrap();
}

/// A SIGKILLed driver leaves the gate installed; the next start
/// finds the sentinel, restores the original hook, and moves on.
#[test]
fn killed_phase_two_leaves_a_recoverable_gate() {
    let w = world("- [ ] 1. Whatever\n");
    let hooks = w.project.path.join(".git/hooks");
    std::fs::create_dir_all(&hooks).unwrap();
    let original = "#!/bin/sh\nexec pre-existing-lint\n";
    std::fs::write(hooks.join("pre-commit"), original).unwrap();

    // Phase 2 enters the gate, then the process dies without exit()
    commit_gate::enter(&w.project.path).unwrap();
    let body = std::fs::read_to_string(hooks.join("pre-commit")).unwrap();
    assert!(body.contains(commit_gate::GATE_SENTINEL));

    // Recovery sweep on next start
    assert!(commit_gate::recover(&w.project.path).unwrap());
    similar_asserts::assert_eq!(
        std::fs::read_to_string(hooks.join("pre-commit")).unwrap(),
        original
    );
    assert!(!commit_gate::recover(&w.project.path).unwrap());
}
