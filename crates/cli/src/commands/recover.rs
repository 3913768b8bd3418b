// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sw recover` — startup sweep after a crashed run.
//!
//! Restores the runner state file (dropping records whose process died
//! or whose config changed) and removes leftover commit gates from
//! every cached project.

use sw_core::{Config, RetryPolicy};
use sw_engine::{commit_gate, ActivityLog, EngineError, RunnerManager};
use sw_storage::{project_cache_path, runner_state_path, ProjectCache, RunnerStateFile};

pub fn run(config: Config) -> i32 {
    match execute(&config) {
        Ok(()) => 0,
        Err(e) => super::report(&e),
    }
}

fn execute(config: &Config) -> Result<(), EngineError> {
    let activity = ActivityLog::new(sw_storage::state_dir().join("activity.log"));

    // Adopt or drop persisted runner records
    let persisted = RunnerStateFile::load(&runner_state_path())?;
    let total = persisted.runners.len();
    let manager = RunnerManager::new(
        runner_state_path(),
        RetryPolicy::new(config.retry.clone()),
        config.config_hash(),
    );
    let dropped = manager.restore(persisted.runners).len();
    println!(
        "runners: {} restored, {} dropped",
        total - dropped,
        dropped
    );

    // Sweep leftover commit gates across every known project
    let cache = ProjectCache::load(&project_cache_path())?;
    let mut recovered = 0;
    for project in &cache.projects {
        match commit_gate::recover(project) {
            Ok(true) => {
                recovered += 1;
                activity.info(
                    "commit_gate_recovered",
                    serde_json::json!({"project": project}),
                );
                println!("recovered commit gate in {}", project.display());
            }
            Ok(false) => {}
            Err(e) => {
                eprintln!("gate sweep failed in {}: {}", project.display(), e);
            }
        }
    }
    if recovered == 0 {
        println!("no leftover commit gates");
    }
    Ok(())
}
