// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background state poller.
//!
//! A single worker loops at a fixed interval: refresh project/spec
//! membership, re-parse task documents whose mtime moved, tail runner
//! logs, watch git HEAD, then run the manager's health scan. Everything
//! it learns is published on the [`UpdateBus`]; it owns only its own
//! bookkeeping (`last` mtimes, offsets, heads) and never touches
//! AppState directly.

use crate::runner::RunnerManager;
use crate::update_bus::UpdateBus;
use indexmap::IndexSet;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use sw_core::{Clock, Config, SpecId, StateUpdate, SystemClock};
use sw_probes::fsprobe;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Poller settings, usually derived from the [`Config`].
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub interval: Duration,
    pub workspace_root: PathBuf,
    pub workflow_dir_name: String,
    pub tasks_filename: String,
    pub log_tail_bytes: u64,
}

impl From<&Config> for PollerConfig {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.poll_interval(),
            workspace_root: config.workspace_root.clone(),
            workflow_dir_name: config.workflow_dir_name.clone(),
            tasks_filename: config.tasks_filename.clone(),
            log_tail_bytes: config.log_tail_bytes,
        }
    }
}

#[derive(Default)]
struct SpecTrack {
    tasks_mtime: Option<SystemTime>,
    log_path: Option<PathBuf>,
    log_offset: u64,
}

/// The background polling worker.
pub struct StatePoller<C: Clock = SystemClock> {
    config: PollerConfig,
    manager: std::sync::Arc<RunnerManager<C>>,
    bus: UpdateBus,
    projects: IndexSet<PathBuf>,
    heads: HashMap<PathBuf, String>,
    specs: HashMap<SpecId, SpecTrack>,
}

impl<C: Clock> StatePoller<C> {
    pub fn new(
        config: PollerConfig,
        manager: std::sync::Arc<RunnerManager<C>>,
        bus: UpdateBus,
    ) -> Self {
        Self {
            config,
            manager,
            bus,
            projects: IndexSet::new(),
            heads: HashMap::new(),
            specs: HashMap::new(),
        }
    }

    /// Run until the stop signal flips. The current cycle always
    /// completes before the loop returns, so shutdown is bounded by the
    /// interval plus the longest single probe timeout.
    pub async fn run(mut self, mut stop: watch::Receiver<bool>) {
        loop {
            self.poll_cycle().await;
            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        debug!("state poller stopping");
                        return;
                    }
                }
            }
        }
    }

    /// One full poll cycle. Public for tests and for one-shot CLI use.
    pub async fn poll_cycle(&mut self) {
        self.refresh_membership();

        let projects: Vec<PathBuf> = self.projects.iter().cloned().collect();
        for project_path in projects {
            let project =
                sw_core::Project::new(project_path.clone(), &self.config.workflow_dir_name);
            let specs = match sw_probes::list_specs(&project, &self.config.tasks_filename) {
                Ok(specs) => specs,
                Err(e) => {
                    warn!(project = %project_path.display(), error = %e, "spec listing failed");
                    continue;
                }
            };

            for spec in &specs {
                let spec_id = SpecId::for_spec(&project_path, &spec.name);
                self.poll_tasks(&spec_id, spec);
                self.poll_log(&spec_id, spec, &project_path);
            }

            self.poll_git_head(&project_path, &specs).await;
        }

        let transitions = self.manager.health_scan();
        self.bus.send_all(transitions);
    }

    /// Step 1: project membership, emitted only on diff.
    fn refresh_membership(&mut self) {
        let discovered = match sw_probes::discover_projects(
            &self.config.workspace_root,
            &self.config.workflow_dir_name,
        ) {
            Ok(projects) => projects
                .into_iter()
                .map(|p| p.path)
                .collect::<IndexSet<_>>(),
            Err(e) => {
                // Degrade to the last-known membership on read errors
                warn!(error = %e, "project discovery failed");
                return;
            }
        };

        if discovered != self.projects {
            self.projects = discovered;
            self.bus.send(StateUpdate::ProjectSetChanged {
                projects: self.projects.iter().cloned().collect(),
            });
        }
    }

    /// Step 2a: re-parse the tasks document when its mtime moved.
    fn poll_tasks(&mut self, spec_id: &SpecId, spec: &sw_core::Spec) {
        let track = self.specs.entry(spec_id.clone()).or_default();
        let mtime = fsprobe::mtime(&spec.tasks_path);
        if mtime == track.tasks_mtime {
            return;
        }
        track.tasks_mtime = mtime;

        match std::fs::read_to_string(&spec.tasks_path) {
            Ok(text) => {
                let stats = sw_taskdoc::parse(&text).stats();
                self.bus.send(StateUpdate::TaskCountsChanged {
                    spec_id: spec_id.clone(),
                    stats,
                });
            }
            Err(e) => {
                warn!(path = %spec.tasks_path.display(), error = %e, "tasks read failed");
            }
        }
    }

    /// Step 2b: tail the active runner log.
    fn poll_log(&mut self, spec_id: &SpecId, spec: &sw_core::Spec, project_path: &PathBuf) {
        // Prefer the live runner's log; fall back to the last one seen
        let active_log = self
            .manager
            .list_active()
            .into_iter()
            .find(|r| r.is_for(project_path, &spec.name))
            .map(|r| r.log_path);

        let track = self.specs.entry(spec_id.clone()).or_default();
        if let Some(log_path) = active_log {
            if track.log_path.as_ref() != Some(&log_path) {
                // New attempt, new file: restart offset bookkeeping
                track.log_path = Some(log_path);
                track.log_offset = 0;
            }
        }
        let Some(log_path) = track.log_path.clone() else {
            return;
        };

        let size = match std::fs::metadata(&log_path) {
            Ok(meta) => meta.len(),
            Err(_) => return,
        };
        if size == track.log_offset {
            return;
        }

        match fsprobe::tail_from(&log_path, track.log_offset, self.config.log_tail_bytes) {
            Ok((bytes, new_size)) => {
                track.log_offset = new_size;
                if !bytes.is_empty() {
                    self.bus.send(StateUpdate::LogAppended {
                        spec_id: spec_id.clone(),
                        tail: String::from_utf8_lossy(&bytes).into_owned(),
                    });
                }
            }
            Err(e) => {
                warn!(path = %log_path.display(), error = %e, "log tail failed");
            }
        }
    }

    /// Step 2c: observe HEAD movement, once per project.
    async fn poll_git_head(&mut self, project_path: &PathBuf, specs: &[sw_core::Spec]) {
        let head = match sw_probes::git_head(project_path).await {
            Ok(head) => head,
            // Not a repo or git unavailable: nothing to observe
            Err(_) => return,
        };

        let last = self.heads.insert(project_path.clone(), head.clone());
        let first_observation = last.is_none();
        if first_observation || last.as_deref() == Some(head.as_str()) {
            return;
        }

        let subject = sw_probes::commit_subject(project_path, &head)
            .await
            .unwrap_or_default();
        for spec in specs {
            self.bus.send(StateUpdate::CommitObserved {
                spec_id: SpecId::for_spec(project_path, &spec.name),
                hash: head.clone(),
                subject: subject.clone(),
            });
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
