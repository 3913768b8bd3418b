// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Smart completion checking.
//!
//! Replaces naive "did the subprocess exit" circuit breakers with three
//! signals in strict priority: new commits past the baseline, a session
//! probe, and commit rescue. Commits always win; probes are bounded by
//! a budget; rescue is re-verified through git before it counts.

use crate::error::EngineError;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sw_adapters::{CompletionProbe, ProbeStatus, Rescue};
use sw_core::{CompletionConfig, CompletionResult, CompletionStatus};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Probe failures tolerated in a row before giving up on probing.
const MAX_CONSECUTIVE_PROBE_FAILURES: u32 = 3;

/// Checker tunables, usually derived from the completion config.
#[derive(Debug, Clone)]
pub struct CompletionTunables {
    pub max_probes: u32,
    pub probe_interval: Duration,
    pub probe_timeout: Duration,
    pub final_rescue: bool,
}

impl From<&CompletionConfig> for CompletionTunables {
    fn from(config: &CompletionConfig) -> Self {
        Self {
            max_probes: config.max_probes,
            probe_interval: Duration::from_secs_f64(config.probe_interval_s),
            probe_timeout: Duration::from_secs_f64(config.probe_timeout_s),
            final_rescue: config.final_rescue,
        }
    }
}

enum RescueCheck {
    /// Nothing uncommitted; there was nothing to rescue
    NothingDirty,
    /// Rescue ran but no commit appeared
    Failed,
    /// Commits exist now
    Committed(u64),
}

/// Decides whether an iteration produced real progress.
pub struct SmartCompletionChecker {
    tunables: CompletionTunables,
    probe: Arc<dyn CompletionProbe>,
    rescue: Arc<dyn Rescue>,
}

impl SmartCompletionChecker {
    pub fn new(
        tunables: CompletionTunables,
        probe: Arc<dyn CompletionProbe>,
        rescue: Arc<dyn Rescue>,
    ) -> Self {
        Self {
            tunables,
            probe,
            rescue,
        }
    }

    /// Run the full decision for one iteration.
    ///
    /// Issues at most `max_probes` probes; a cancellation aborts at the
    /// next interval boundary and reports `timeout`.
    pub async fn check(
        &self,
        project_path: &Path,
        spec_name: &str,
        baseline: &str,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<CompletionResult, EngineError> {
        let mut probes_used = 0u32;
        let mut consecutive_failures = 0u32;

        loop {
            // Signal A: commits trump everything, checked before every probe
            let commits = sw_probes::new_commit_count(project_path, baseline).await?;
            if commits > 0 {
                info!(spec = spec_name, commits, "completion: new commits");
                return Ok(CompletionResult::commits_created(commits));
            }

            if probes_used >= self.tunables.max_probes {
                break;
            }

            // Signal B: ask the session
            let reply = match self.probe.probe(project_path).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!(spec = spec_name, error = %e, "completion probe failed");
                    sw_adapters::ProbeReply::error(e.to_string())
                }
            };
            probes_used += 1;
            debug!(spec = spec_name, probes_used, status = ?reply.status, "probe reply");

            if !reply.should_continue {
                return Ok(CompletionResult::without_progress(
                    CompletionStatus::LlmStopped,
                    probes_used,
                ));
            }

            match reply.status {
                ProbeStatus::Error => {
                    consecutive_failures += 1;
                    if consecutive_failures >= MAX_CONSECUTIVE_PROBE_FAILURES {
                        return Ok(CompletionResult::without_progress(
                            CompletionStatus::ProbeError,
                            probes_used,
                        ));
                    }
                }
                ProbeStatus::Working | ProbeStatus::Waiting => {
                    consecutive_failures = 0;
                }
                ProbeStatus::Complete => {
                    consecutive_failures = 0;
                    // Signal C: the session claims completion; try to
                    // convert any uncommitted work into commits
                    match self.try_rescue(project_path, spec_name, baseline).await? {
                        RescueCheck::Committed(commits) => {
                            return Ok(CompletionResult::rescued(commits, probes_used, false));
                        }
                        RescueCheck::NothingDirty => {
                            return Ok(CompletionResult::without_progress(
                                CompletionStatus::NothingToDo,
                                probes_used,
                            ));
                        }
                        RescueCheck::Failed => {
                            // Keep probing; the session may still commit
                        }
                    }
                }
            }

            if probes_used >= self.tunables.max_probes {
                break;
            }
            if self.wait_interval(cancel).await {
                return Ok(CompletionResult::without_progress(
                    CompletionStatus::Timeout,
                    probes_used,
                ));
            }
        }

        // Final guard: one last rescue attempt after the budget is spent
        if self.tunables.final_rescue {
            if let RescueCheck::Committed(commits) =
                self.try_rescue(project_path, spec_name, baseline).await?
            {
                return Ok(CompletionResult::rescued(commits, probes_used, true));
            }
        }

        Ok(CompletionResult::without_progress(
            CompletionStatus::Timeout,
            probes_used,
        ))
    }

    /// Returns true when canceled.
    async fn wait_interval(&self, cancel: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(self.tunables.probe_interval) => false,
            changed = cancel.changed() => changed.is_err() || *cancel.borrow(),
        }
    }

    async fn try_rescue(
        &self,
        project_path: &Path,
        spec_name: &str,
        baseline: &str,
    ) -> Result<RescueCheck, EngineError> {
        let dirty = sw_probes::dirty_paths(project_path).await?;
        if dirty.is_empty() {
            return Ok(RescueCheck::NothingDirty);
        }

        info!(spec = spec_name, files = dirty.len(), "attempting commit rescue");
        let outcome = self.rescue.rescue(project_path, spec_name).await?;
        if !outcome.ok {
            warn!(spec = spec_name, detail = %outcome.detail, "rescue reported failure");
        }

        // Never trust the adapter: re-verify through Signal A
        let commits = sw_probes::new_commit_count(project_path, baseline).await?;
        if commits > 0 {
            Ok(RescueCheck::Committed(commits))
        } else {
            Ok(RescueCheck::Failed)
        }
    }
}

#[cfg(test)]
#[path = "completion_tests.rs"]
mod tests;
