// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Three-phase iteration driver.
//!
//! One iteration is validation → implementation under the commit gate →
//! verification. Phase 1 and 3 mutate `tasks.md` only through atomic
//! rewrites; Phase 2 always removes the gate on the way out, panic
//! included. Iterations repeat until the spec completes or the
//! no-commit streak trips the stall guard.

use crate::activity_log::ActivityLog;
use crate::commit_gate::GateGuard;
use crate::completion::SmartCompletionChecker;
use crate::error::EngineError;
use crate::runner::RunnerManager;
use crate::update_bus::UpdateBus;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use sw_adapters::provider::Provider;
use sw_core::{
    Clock, CompletionResult, CompletionStatus, Config, Project, RunnerStatus, Spec, SystemClock,
    TaskStats,
};
use sw_taskdoc::{promote_implemented, reset_unimplemented, validate, Issue, MockPatterns};
use tokio::sync::watch;
use tracing::{info, warn};

const WAIT_POLL: Duration = Duration::from_millis(500);

const IMPLEMENTATION_PROMPT: &str = "Work through the task list in {tasks}. Implementation only: \
pick the next pending task, implement it fully, mark its checkbox, and commit the work to git. \
Never mark a task complete without an implementation and a commit.";

/// How a drive ended (stalls surface as errors instead).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriveOutcome {
    /// Every task in the spec is completed
    Done,
    /// The cancel signal fired
    Canceled,
}

/// Summary of a finished drive.
#[derive(Debug, Clone)]
pub struct DriveSummary {
    pub iterations: u32,
    pub outcome: DriveOutcome,
    pub final_stats: TaskStats,
    pub last_completion: Option<CompletionResult>,
}

enum Phase1Outcome {
    Done(TaskStats),
    Ready(TaskStats),
}

struct Phase2Outcome {
    baseline: String,
    canceled: bool,
}

struct Phase3Report {
    promoted: Vec<String>,
    result: CompletionResult,
    stats: TaskStats,
}

/// Drives iterations for one `(project, spec)` at a time.
pub struct IterationDriver<C: Clock = SystemClock> {
    config: Config,
    patterns: MockPatterns,
    manager: Arc<RunnerManager<C>>,
    checker: SmartCompletionChecker,
    provider: Arc<dyn Provider>,
    bus: Option<UpdateBus>,
    activity: ActivityLog,
}

impl<C: Clock> IterationDriver<C> {
    pub fn new(
        config: Config,
        manager: Arc<RunnerManager<C>>,
        checker: SmartCompletionChecker,
        provider: Arc<dyn Provider>,
        bus: Option<UpdateBus>,
        activity: ActivityLog,
    ) -> Result<Self, EngineError> {
        let patterns = MockPatterns::new(&config.mock_only_path_patterns)
            .map_err(|e| EngineError::precondition(format!("invalid mock pattern: {}", e)))?;
        Ok(Self {
            config,
            patterns,
            manager,
            checker,
            provider,
            bus,
            activity,
        })
    }

    /// Run iterations until the spec is done, the driver stalls, or the
    /// cancel signal fires.
    pub async fn run(
        &self,
        project: &Project,
        spec: &Spec,
        mut cancel: watch::Receiver<bool>,
    ) -> Result<DriveSummary, EngineError> {
        let mut iteration = 0u32;
        let mut no_commit_streak = 0u32;
        let mut last_completion = None;

        loop {
            iteration += 1;
            if *cancel.borrow() {
                return Ok(self.summary(spec, iteration, DriveOutcome::Canceled, last_completion));
            }
            self.activity.info(
                "iteration_started",
                json!({"spec": spec.name, "iteration": iteration}),
            );

            // Phase 1 — pre-session validation
            let stats = match self.phase1(project, spec, iteration)? {
                Phase1Outcome::Done(stats) => {
                    info!(spec = %spec.name, %stats, "spec is done");
                    self.activity.info(
                        "iteration_done",
                        json!({"spec": spec.name, "iteration": iteration}),
                    );
                    return Ok(DriveSummary {
                        iterations: iteration,
                        outcome: DriveOutcome::Done,
                        final_stats: stats,
                        last_completion,
                    });
                }
                Phase1Outcome::Ready(stats) => stats,
            };
            info!(spec = %spec.name, iteration, %stats, "starting implementation phase");

            // Phase 2 — implementation under the commit gate
            let phase2 = self.phase2(project, spec, &mut cancel).await?;
            if phase2.canceled {
                return Ok(self.summary(spec, iteration, DriveOutcome::Canceled, last_completion));
            }

            // Phase 3 — post-session verification
            let report = self
                .phase3(project, spec, iteration, &phase2.baseline, &mut cancel)
                .await?;
            let task_change = !report.promoted.is_empty();
            let progressed = report.result.status.is_progress();
            last_completion = Some(report.result.clone());

            if progressed {
                no_commit_streak = 0;
            } else if !task_change {
                no_commit_streak += 1;
                if no_commit_streak >= self.config.no_commit_limit {
                    self.manager.clear(&project.path, &spec.name);
                    self.activity.warn(
                        "driver_stalled",
                        json!({"spec": spec.name, "streak": no_commit_streak}),
                    );
                    return Err(EngineError::Stalled {
                        streak: no_commit_streak,
                    });
                }
            }

            self.activity.info(
                "iteration_completed",
                json!({
                    "spec": spec.name,
                    "iteration": iteration,
                    "status": report.result.status.to_string(),
                    "new_commits": report.result.new_commits,
                    "promoted": report.promoted,
                    "no_commit_streak": no_commit_streak,
                }),
            );
        }
    }

    /// Phase 1 without side effects: parse, validate, and report which
    /// completed tasks would be reset. Used by `--dry-run`.
    pub fn dry_run(&self, project: &Project, spec: &Spec) -> Result<(TaskStats, Vec<Issue>), EngineError> {
        let text = self.read_tasks(spec)?;
        self.fail_on_parse_errors(spec, &text)?;
        let issues = validate(&text, &self.patterns);
        let probe = sw_probes::WorkspaceFiles::new(&project.path);
        let stats = sw_taskdoc::parse(&reset_unimplemented(&text, &probe, &self.patterns).text).stats();
        Ok((stats, issues))
    }

    fn phase1(
        &self,
        project: &Project,
        spec: &Spec,
        iteration: u32,
    ) -> Result<Phase1Outcome, EngineError> {
        let text = self.read_tasks(spec)?;
        self.fail_on_parse_errors(spec, &text)?;

        let mut stats = sw_taskdoc::parse(&text).stats();

        if self.config.three_phase_enabled {
            let issues = validate(&text, &self.patterns);
            let probe = sw_probes::WorkspaceFiles::new(&project.path);
            let reset = reset_unimplemented(&text, &probe, &self.patterns);

            let mut lines: Vec<String> = issues.iter().map(|i| i.to_string()).collect();
            if reset.changed() {
                lines.push(format!("reset to in-progress: {}", reset.reset_ids.join(", ")));
            }
            lines.push(format!("stats: {}", sw_taskdoc::parse(&reset.text).stats()));
            self.write_phase_log(spec, "validation", iteration, &lines);

            if reset.changed() {
                sw_storage::save_text_atomic(&spec.tasks_path, &reset.text)?;
                stats = sw_taskdoc::parse(&reset.text).stats();
            }
        }

        if stats.all_done() {
            Ok(Phase1Outcome::Done(stats))
        } else {
            Ok(Phase1Outcome::Ready(stats))
        }
    }

    async fn phase2(
        &self,
        project: &Project,
        spec: &Spec,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<Phase2Outcome, EngineError> {
        // Gate install happens-before spawn; the guard's Drop covers
        // every exit path including panics.
        let gate = if self.config.commit_gate_enabled {
            Some(GateGuard::enter(&project.path)?)
        } else {
            None
        };

        let prompt = IMPLEMENTATION_PROMPT.replace("{tasks}", &spec.tasks_path.display().to_string());
        let record = self
            .manager
            .start(
                project,
                spec,
                self.provider.as_ref(),
                &prompt,
                &self.config.provider_config_overrides,
            )
            .await?;
        self.activity.info(
            "runner_started",
            json!({
                "spec": spec.name,
                "runner_id": record.id.to_string(),
                "pid": record.pid,
                "provider": record.provider,
            }),
        );

        let bus = self.bus.clone();
        let final_record = self
            .manager
            .wait_for_exit(&record.id, cancel, WAIT_POLL, move |updates| {
                if let Some(bus) = &bus {
                    bus.send_all(updates);
                }
            })
            .await?;

        if let Some(gate) = gate {
            if let Err(e) = gate.release() {
                warn!(error = %e, "commit gate removal failed");
            }
        }

        let canceled = final_record.status == RunnerStatus::Stopped && *cancel.borrow();
        Ok(Phase2Outcome {
            baseline: record.baseline_commit.unwrap_or_default(),
            canceled,
        })
    }

    async fn phase3(
        &self,
        project: &Project,
        spec: &Spec,
        iteration: u32,
        baseline: &str,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<Phase3Report, EngineError> {
        let mut promoted = Vec::new();
        let mut stats = TaskStats::default();

        match self.read_tasks(spec) {
            Ok(text) if self.config.three_phase_enabled => {
                let probe = sw_probes::WorkspaceFiles::new(&project.path);
                let outcome = promote_implemented(&text, &probe, &self.patterns);
                if outcome.changed() {
                    sw_storage::save_text_atomic(&spec.tasks_path, &outcome.text)?;
                }
                stats = sw_taskdoc::parse(&outcome.text).stats();
                promoted = outcome.promoted_ids;
            }
            Ok(text) => {
                stats = sw_taskdoc::parse(&text).stats();
            }
            Err(e) => {
                // Reads degrade to last-known state; verification continues
                warn!(spec = %spec.name, error = %e, "phase 3 could not re-read tasks");
            }
        }

        let result = if self.config.three_phase_enabled {
            self.checker
                .check(&project.path, &spec.name, baseline, cancel)
                .await?
        } else {
            // Legacy mode: commits are the only signal
            let commits = sw_probes::new_commit_count(&project.path, baseline).await?;
            if commits > 0 {
                CompletionResult::commits_created(commits)
            } else {
                CompletionResult::without_progress(CompletionStatus::Timeout, 0)
            }
        };

        let mut lines = vec![
            format!("completion: {}", result.status),
            format!("new commits: {}", result.new_commits),
            format!("probes used: {}", result.probes_used),
            format!("stats: {}", stats),
        ];
        if !promoted.is_empty() {
            lines.push(format!("promoted to completed: {}", promoted.join(", ")));
        }
        self.write_phase_log(spec, "verification", iteration, &lines);

        Ok(Phase3Report {
            promoted,
            result,
            stats,
        })
    }

    fn read_tasks(&self, spec: &Spec) -> Result<String, EngineError> {
        std::fs::read_to_string(&spec.tasks_path).map_err(|_| {
            EngineError::precondition(format!("{} is missing", spec.tasks_path.display()))
        })
    }

    fn fail_on_parse_errors(&self, spec: &Spec, text: &str) -> Result<(), EngineError> {
        let doc = sw_taskdoc::parse(text);
        if doc.has_errors() {
            let detail = doc
                .issues
                .iter()
                .map(|i| i.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            self.activity.warn(
                "task_format_invalid",
                json!({"spec": spec.name, "detail": detail}),
            );
            return Err(EngineError::TaskFormatInvalid { detail });
        }
        Ok(())
    }

    fn write_phase_log(&self, spec: &Spec, phase: &str, iteration: u32, lines: &[String]) {
        let path = spec.phase_log_path(phase, iteration);
        let ts = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
        let mut body = String::new();
        for line in lines {
            body.push_str(&format!("{} [{}] {}\n", ts, phase, line));
        }
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = std::fs::write(&path, body) {
            warn!(path = %path.display(), error = %e, "failed to write phase log");
        }
    }

    fn summary(
        &self,
        spec: &Spec,
        iterations: u32,
        outcome: DriveOutcome,
        last_completion: Option<CompletionResult>,
    ) -> DriveSummary {
        let final_stats = std::fs::read_to_string(&spec.tasks_path)
            .map(|text| sw_taskdoc::parse(&text).stats())
            .unwrap_or_default();
        DriveSummary {
            iterations,
            outcome,
            final_stats,
            last_completion,
        }
    }
}

#[cfg(test)]
#[path = "driver_tests.rs"]
mod tests;
