// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runner lifecycle supervision.
//!
//! The manager exclusively owns the set of active [`RunnerRecord`]s.
//! Children run detached with their output appended to per-spec log
//! files; liveness is observed (`try_wait` for owned children, pid +
//! fingerprint for records restored after a host restart), never
//! assumed. Crashed runners are rescheduled through the retry policy
//! against the injected [`Clock`], so tests drive time instead of
//! sleeping. All map mutations happen under one mutex; no lock is held
//! across an await.

use crate::error::EngineError;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process::{Child, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use sw_adapters::provider::{Provider, ProviderOverrides};
use sw_core::{
    Clock, Project, RetryPolicy, RunnerId, RunnerRecord, RunnerStatus, Spec, StateUpdate,
    SystemClock,
};
use sw_probes::process::{pid_alive, send_signal};
use sw_storage::RunnerStateFile;
use tokio::sync::watch;
use tracing::warn;

/// Default grace period before a stop escalates to SIGKILL.
pub const STOP_GRACE: Duration = Duration::from_secs(5);

/// Soft cap on concurrently supervised runners. Breaches are reported,
/// not enforced.
pub const SOFT_CONCURRENCY_LIMIT: usize = 5;

/// Everything needed to respawn a crashed runner.
#[derive(Debug, Clone, Default)]
struct SpawnSpec {
    argv: Vec<String>,
    cwd: PathBuf,
}

struct ActiveRunner {
    record: RunnerRecord,
    /// Owned handle for children we spawned; `None` for restored records
    child: Option<Child>,
    spawn: SpawnSpec,
    /// Set while a retry is scheduled
    next_retry_at: Option<Instant>,
}

/// Supervises runner subprocesses for the whole host.
pub struct RunnerManager<C: Clock = SystemClock> {
    inner: Arc<Mutex<HashMap<RunnerId, ActiveRunner>>>,
    /// Terminal records kept for callers awaiting an exit
    finished: Arc<Mutex<HashMap<RunnerId, RunnerRecord>>>,
    state_path: PathBuf,
    retry: RetryPolicy,
    config_hash: String,
    clock: C,
}

impl RunnerManager<SystemClock> {
    pub fn new(state_path: PathBuf, retry: RetryPolicy, config_hash: String) -> Self {
        Self::with_clock(state_path, retry, config_hash, SystemClock)
    }
}

impl<C: Clock> RunnerManager<C> {
    pub fn with_clock(
        state_path: PathBuf,
        retry: RetryPolicy,
        config_hash: String,
        clock: C,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            finished: Arc::new(Mutex::new(HashMap::new())),
            state_path,
            retry,
            config_hash,
            clock,
        }
    }

    /// Start a supervised runner for `(project, spec)`.
    ///
    /// Preconditions are checked in order and fail with a typed error
    /// before anything is spawned: no active runner for the pair, clean
    /// working tree, provider health, and at least one actionable task.
    /// The record is persisted before this returns; a spawn failure
    /// yields a `crashed` record with the retry policy already applied.
    pub async fn start(
        &self,
        project: &Project,
        spec: &Spec,
        provider: &dyn Provider,
        prompt: &str,
        overrides: &ProviderOverrides,
    ) -> Result<RunnerRecord, EngineError> {
        if self.active_for(&project.path, &spec.name) {
            return Err(EngineError::precondition(format!(
                "a runner is already active for {}:{}",
                project.path.display(),
                spec.name
            )));
        }

        if !sw_probes::working_tree_clean(&project.path).await? {
            return Err(EngineError::precondition(format!(
                "working tree at {} is dirty",
                project.path.display()
            )));
        }

        if let Err(reason) = provider.health_check(&project.path) {
            return Err(EngineError::precondition(format!(
                "provider {} health check failed: {}",
                provider.name(),
                reason
            )));
        }

        let tasks_text = std::fs::read_to_string(&spec.tasks_path).map_err(|_| {
            EngineError::precondition(format!("{} is missing", spec.tasks_path.display()))
        })?;
        if !sw_taskdoc::parse(&tasks_text).stats().has_actionable() {
            return Err(EngineError::precondition(format!(
                "spec {} has no pending or in-progress tasks",
                spec.name
            )));
        }

        let baseline = sw_probes::git_head(&project.path).await?;
        let argv = provider.build_argv(prompt, &project.path, overrides);
        let log_path = spec.runner_log_path(0);
        let now = Utc::now();

        let mut record = RunnerRecord {
            id: RunnerId::new(uuid::Uuid::new_v4().to_string()),
            project_path: project.path.clone(),
            spec_name: spec.name.clone(),
            provider: provider.name().to_string(),
            model: provider.model().to_string(),
            pid: 0,
            cmd_fingerprint: provider.cmd_fingerprint(),
            status: RunnerStatus::Starting,
            start_time: now,
            last_activity_time: now,
            last_retry_time: None,
            retry_count: 0,
            max_retries: self.retry.max_retries(),
            config_hash: self.config_hash.clone(),
            log_path,
            baseline_commit: Some(baseline),
            exit_code: None,
        };

        // Persist before the child can do any work; a persistence
        // failure here fails the start closed.
        self.persist_with(&record)?;

        let spawn = SpawnSpec {
            argv,
            cwd: project.path.clone(),
        };
        let mut runner = match spawn_child(&spawn.argv, &spawn.cwd, &record.log_path) {
            Ok(child) => {
                record.pid = child.id();
                record.status = RunnerStatus::Running;
                ActiveRunner {
                    record,
                    child: Some(child),
                    spawn,
                    next_retry_at: None,
                }
            }
            Err(e) => {
                warn!(spec = %spec.name, error = %e, "runner spawn failed");
                record.status = RunnerStatus::Crashed;
                record.exit_code = None;
                ActiveRunner {
                    record,
                    child: None,
                    spawn,
                    next_retry_at: None,
                }
            }
        };

        if runner.record.status == RunnerStatus::Crashed {
            let mut scratch = Vec::new();
            self.schedule_retry(&mut runner, self.clock.now(), &mut scratch);
        }

        let record = runner.record.clone();
        {
            let mut inner = self.inner.lock();
            // Re-check under the lock; a concurrent start may have won
            if inner
                .values()
                .any(|r| r.record.is_for(&project.path, &spec.name))
            {
                if let Some(child) = runner.child.as_mut() {
                    let _ = child.kill();
                    let _ = child.wait();
                }
                return Err(EngineError::precondition(format!(
                    "a runner is already active for {}:{}",
                    project.path.display(),
                    spec.name
                )));
            }
            inner.insert(record.id.clone(), runner);
            if inner.len() > SOFT_CONCURRENCY_LIMIT {
                warn!(
                    active = inner.len(),
                    limit = SOFT_CONCURRENCY_LIMIT,
                    "soft concurrency limit exceeded"
                );
            }
        }
        self.persist();
        Ok(record)
    }

    /// Stop a runner: graceful signal, then SIGKILL after `grace`.
    ///
    /// The record is removed from the active set and parked in the
    /// finished map with status `stopped`.
    pub async fn stop(
        &self,
        id: &RunnerId,
        grace: Duration,
    ) -> Result<Option<RunnerRecord>, EngineError> {
        let Some(mut runner) = self.inner.lock().remove(id) else {
            return Ok(self.finished.lock().get(id).cloned());
        };

        let pid = runner.record.pid;
        if pid != 0 {
            send_signal(pid, "TERM");
        }

        let deadline = tokio::time::Instant::now() + grace;
        let mut exit_code = None;
        let mut exited = false;
        loop {
            match &mut runner.child {
                Some(child) => match child.try_wait() {
                    Ok(Some(status)) => {
                        exit_code = status.code();
                        exited = true;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        warn!(error = %e, "try_wait failed during stop");
                        exited = true;
                    }
                },
                None => {
                    if !pid_alive(pid, &runner.record.cmd_fingerprint) {
                        exited = true;
                    }
                }
            }
            if exited || tokio::time::Instant::now() >= deadline {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        if !exited {
            warn!(pid, "runner did not exit within grace period, killing");
            match &mut runner.child {
                Some(child) => {
                    let _ = child.kill();
                    let _ = child.wait();
                }
                None => {
                    send_signal(pid, "KILL");
                }
            }
        }

        runner.record.status = RunnerStatus::Stopped;
        runner.record.exit_code = exit_code;
        runner.record.touch(Utc::now());
        self.finished
            .lock()
            .insert(id.clone(), runner.record.clone());
        self.persist();
        Ok(Some(runner.record))
    }

    pub fn status(&self, id: &RunnerId) -> Option<RunnerStatus> {
        if let Some(runner) = self.inner.lock().get(id) {
            return Some(runner.record.status);
        }
        self.finished.lock().get(id).map(|r| r.status)
    }

    pub fn list_active(&self) -> Vec<RunnerRecord> {
        self.inner
            .lock()
            .values()
            .map(|r| r.record.clone())
            .collect()
    }

    /// One supervision pass: observe exits, mark `completed`/`crashed`,
    /// apply the retry policy, and respawn runners whose backoff is due.
    ///
    /// Returns the status transitions for the poller to publish.
    pub fn health_scan(&self) -> Vec<StateUpdate> {
        let now = self.clock.now();
        let mut updates = Vec::new();
        let mut to_finish = Vec::new();
        let mut dirty = false;

        {
            let mut inner = self.inner.lock();
            for (id, runner) in inner.iter_mut() {
                match runner.record.status {
                    RunnerStatus::Running => {
                        let exit = observe_exit(runner);
                        if let Some(exit_code) = exit {
                            runner.child = None;
                            runner.record.exit_code = exit_code;
                            runner.record.touch(Utc::now());
                            dirty = true;
                            if exit_code == Some(0) {
                                runner.record.status = RunnerStatus::Completed;
                                updates.push(status_update(&runner.record));
                                to_finish.push(id.clone());
                            } else {
                                runner.record.status = RunnerStatus::Crashed;
                                updates.push(status_update(&runner.record));
                                self.schedule_retry(runner, now, &mut updates);
                            }
                        }
                    }
                    RunnerStatus::Starting => {
                        let due = runner.next_retry_at.map(|at| now >= at).unwrap_or(false);
                        if due {
                            runner.next_retry_at = None;
                            dirty = true;
                            match spawn_child(
                                &runner.spawn.argv,
                                &runner.spawn.cwd,
                                &runner.record.log_path,
                            ) {
                                Ok(child) => {
                                    runner.record.pid = child.id();
                                    runner.record.status = RunnerStatus::Running;
                                    runner.record.touch(Utc::now());
                                    runner.child = Some(child);
                                    updates.push(status_update(&runner.record));
                                }
                                Err(e) => {
                                    warn!(error = %e, "retry spawn failed");
                                    runner.record.status = RunnerStatus::Crashed;
                                    runner.record.exit_code = None;
                                    updates.push(status_update(&runner.record));
                                    self.schedule_retry(runner, now, &mut updates);
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }

            for id in to_finish {
                if let Some(runner) = inner.remove(&id) {
                    self.finished.lock().insert(id, runner.record);
                }
            }
        }

        if dirty {
            self.persist();
        }
        updates
    }

    /// Schedule a retry for a crashed runner if the policy allows.
    pub fn maybe_retry(&self, id: &RunnerId) -> bool {
        let mut scratch = Vec::new();
        let mut inner = self.inner.lock();
        match inner.get_mut(id) {
            Some(runner) if runner.record.status == RunnerStatus::Crashed => {
                self.schedule_retry(runner, self.clock.now(), &mut scratch);
                runner.next_retry_at.is_some()
            }
            _ => false,
        }
    }

    /// Re-adopt persisted records on process startup.
    ///
    /// A record survives only when its process is still alive under the
    /// recorded fingerprint and it was started under the same config;
    /// everything else is marked stopped and dropped.
    pub fn restore(&self, persisted: Vec<RunnerRecord>) -> Vec<StateUpdate> {
        let mut updates = Vec::new();
        {
            let mut inner = self.inner.lock();
            for mut record in persisted {
                let adopt = record.status == RunnerStatus::Running
                    && record.config_hash == self.config_hash
                    && pid_alive(record.pid, &record.cmd_fingerprint);
                if adopt {
                    inner.insert(
                        record.id.clone(),
                        ActiveRunner {
                            record,
                            child: None,
                            spawn: SpawnSpec::default(),
                            next_retry_at: None,
                        },
                    );
                } else {
                    record.status = RunnerStatus::Stopped;
                    updates.push(status_update(&record));
                }
            }
        }
        self.persist();
        updates
    }

    /// Drop every record (active or finished) for a `(project, spec)`.
    pub fn clear(&self, project_path: &Path, spec_name: &str) -> usize {
        let mut removed = 0;
        {
            let mut inner = self.inner.lock();
            let before = inner.len();
            inner.retain(|_, r| !r.record.is_for(project_path, spec_name));
            removed += before - inner.len();
        }
        {
            let mut finished = self.finished.lock();
            let before = finished.len();
            finished.retain(|_, r| !r.is_for(project_path, spec_name));
            removed += before - finished.len();
        }
        self.persist();
        removed
    }

    /// The runner's record once it can no longer make progress on its
    /// own: completed, stopped, or crashed with the retry budget spent.
    pub fn terminal_record(&self, id: &RunnerId) -> Option<RunnerRecord> {
        if let Some(record) = self.finished.lock().get(id) {
            return Some(record.clone());
        }
        let inner = self.inner.lock();
        inner.get(id).and_then(|runner| {
            if runner.record.status.is_terminal() && runner.next_retry_at.is_none() {
                Some(runner.record.clone())
            } else {
                None
            }
        })
    }

    /// Block until the runner reaches a terminal state, scanning health
    /// every `poll` and forwarding transitions to `on_updates`. On
    /// cancellation the runner is stopped and its stopped record
    /// returned.
    pub async fn wait_for_exit(
        &self,
        id: &RunnerId,
        cancel: &mut watch::Receiver<bool>,
        poll: Duration,
        mut on_updates: impl FnMut(Vec<StateUpdate>),
    ) -> Result<RunnerRecord, EngineError> {
        loop {
            let updates = self.health_scan();
            if !updates.is_empty() {
                on_updates(updates);
            }
            if let Some(record) = self.terminal_record(id) {
                return Ok(record);
            }

            tokio::select! {
                _ = tokio::time::sleep(poll) => {}
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        if let Some(record) = self.stop(id, STOP_GRACE).await? {
                            return Ok(record);
                        }
                        // Stopped by someone else between scan and cancel
                        if let Some(record) = self.terminal_record(id) {
                            return Ok(record);
                        }
                    }
                }
            }
        }
    }

    fn active_for(&self, project_path: &Path, spec_name: &str) -> bool {
        self.inner
            .lock()
            .values()
            .any(|r| r.record.is_for(project_path, spec_name))
    }

    fn schedule_retry(&self, runner: &mut ActiveRunner, now: Instant, updates: &mut Vec<StateUpdate>) {
        // Restored records carry no spawn spec and cannot be respawned
        if runner.spawn.argv.is_empty() {
            return;
        }
        let record = &mut runner.record;
        if !self.retry.should_retry(record.retry_count, record.exit_code) {
            return;
        }
        let delay = self.retry.backoff(record.retry_count);
        record.retry_count += 1;
        record.last_retry_time = Some(Utc::now());
        record.status = RunnerStatus::Starting;
        record.log_path = rotate_log_path(&record.log_path, record.retry_count);
        runner.next_retry_at = Some(now + delay);
        updates.push(status_update(record));
    }

    /// Persist including a record not yet in the map; failure propagates.
    fn persist_with(&self, extra: &RunnerRecord) -> Result<(), EngineError> {
        let mut records: Vec<_> = self
            .inner
            .lock()
            .values()
            .map(|r| r.record.clone())
            .collect();
        records.push(extra.clone());
        RunnerStateFile::new(records)
            .save(&self.state_path)
            .map_err(EngineError::from)
    }

    /// Best-effort persistence of the active set.
    fn persist(&self) {
        let records: Vec<_> = self
            .inner
            .lock()
            .values()
            .map(|r| r.record.clone())
            .collect();
        if let Err(e) = RunnerStateFile::new(records).save(&self.state_path) {
            warn!(path = %self.state_path.display(), error = %e, "failed to persist runner state");
        }
    }
}

fn status_update(record: &RunnerRecord) -> StateUpdate {
    StateUpdate::RunnerStatusChanged {
        runner_id: record.id.clone(),
        status: record.status,
        exit_code: record.exit_code,
    }
}

/// Observe whether a running child has exited. `Some(code)` when dead.
fn observe_exit(runner: &mut ActiveRunner) -> Option<Option<i32>> {
    match &mut runner.child {
        Some(child) => match child.try_wait() {
            Ok(Some(status)) => Some(status.code()),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "try_wait failed, treating runner as crashed");
                Some(None)
            }
        },
        // Restored record: pid + fingerprint is all we have
        None => {
            if pid_alive(runner.record.pid, &runner.record.cmd_fingerprint) {
                None
            } else {
                Some(None)
            }
        }
    }
}

fn spawn_child(argv: &[String], cwd: &Path, log_path: &Path) -> std::io::Result<Child> {
    let Some((program, args)) = argv.split_first() else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "empty argv",
        ));
    };
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log = OpenOptions::new().create(true).append(true).open(log_path)?;
    let log_err = log.try_clone()?;

    let mut cmd = std::process::Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        // The session's own commits pass the commit gate
        .env(crate::commit_gate::GATE_BYPASS_ENV, "1")
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(log_err));
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // Detach from the controlling terminal's process group
        cmd.process_group(0);
    }
    cmd.spawn()
}

/// Next sequential log file alongside the current one.
fn rotate_log_path(current: &Path, attempt: u32) -> PathBuf {
    let dir = current.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("runner_{}.log", attempt))
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
