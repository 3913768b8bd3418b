// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sw run` — drive one spec to completion.

use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use sw_adapters::{provider_for, CommandProbe, CommandRescue};
use sw_core::{format_elapsed, Config, Project, RetryPolicy, Spec};
use sw_engine::{
    update_channel, ActivityLog, CompletionTunables, DriveOutcome, EngineError, IterationDriver,
    PollerConfig, RunnerManager, SmartCompletionChecker, StatePoller, UpdateReader,
};
use sw_storage::{runner_state_path, RunnerStateFile};

/// Prompt handed to the rescue collaborator; `{spec}` is replaced with
/// the spec name.
const RESCUE_PROMPT: &str = "There is uncommitted work for spec {spec} in this repository. \
Review the changes, stage everything that belongs together, and create one or more git commits \
with accurate messages. Do not modify any task checkboxes.";

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Project directory
    #[arg(long)]
    pub project: PathBuf,

    /// Spec name under the workflow's specs directory
    #[arg(long)]
    pub spec: String,

    /// AI provider name
    #[arg(long, default_value = "claude")]
    pub provider: String,

    /// Model name, passed through to the provider
    #[arg(long, default_value = "sonnet")]
    pub model: String,

    /// Run pre-session validation only; mutate nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Rebuild the project discovery cache first
    #[arg(long)]
    pub refresh_cache: bool,
}

pub async fn run(config: Config, args: RunArgs) -> i32 {
    match execute(config, args).await {
        Ok(code) => code,
        Err(e) => super::report(&e),
    }
}

async fn execute(config: Config, args: RunArgs) -> Result<i32, EngineError> {
    let project_path = args.project.canonicalize()?;
    let project = Project::new(&project_path, &config.workflow_dir_name);
    let spec = Spec::new(&project, &args.spec, &config.tasks_filename);

    if args.refresh_cache {
        super::projects::refresh_cache(&config)?;
    }

    // Sweep a gate left behind by a crashed run before anything else
    let activity = ActivityLog::new(sw_storage::state_dir().join("activity.log"));
    if sw_engine::commit_gate::recover(&project.path)? {
        activity.info(
            "commit_gate_recovered",
            serde_json::json!({"project": project.path}),
        );
        eprintln!("recovered a leftover commit gate in {}", project.path.display());
    }

    let provider = provider_for(&args.provider, &args.model)?;
    let manager = Arc::new(RunnerManager::new(
        runner_state_path(),
        RetryPolicy::new(config.retry.clone()),
        config.config_hash(),
    ));
    let restored = RunnerStateFile::load(&runner_state_path())?;
    manager.restore(restored.runners);

    let probe = CommandProbe::new(
        Arc::clone(&provider),
        config.provider_config_overrides.clone(),
        Duration::from_secs_f64(config.completion.probe_timeout_s),
    );
    let rescue = CommandRescue::new(
        Arc::clone(&provider),
        config.provider_config_overrides.clone(),
        Duration::from_secs_f64(config.completion.probe_timeout_s),
        RESCUE_PROMPT,
    );
    let checker = SmartCompletionChecker::new(
        CompletionTunables::from(&config.completion),
        Arc::new(probe),
        Arc::new(rescue),
    );

    let driver = IterationDriver::new(
        config.clone(),
        Arc::clone(&manager),
        checker,
        provider,
        None,
        activity,
    )?;

    if args.dry_run {
        let (stats, issues) = driver.dry_run(&project, &spec)?;
        for issue in &issues {
            println!("{}", issue);
        }
        println!("{}", stats);
        return Ok(0);
    }

    // Background poller feeding progress lines to the terminal
    let (bus, reader) = update_channel(sw_engine::update_bus::DEFAULT_CAPACITY);
    let (stop_tx, stop_rx) = tokio::sync::watch::channel(false);
    let poller = StatePoller::new(PollerConfig::from(&config), Arc::clone(&manager), bus);
    let poller_task = tokio::spawn(poller.run(stop_rx));
    let printer_task = tokio::spawn(print_updates(reader));

    // Ctrl+C cancels the drive
    let (cancel_tx, cancel_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let started = Instant::now();
    let outcome = driver.run(&project, &spec, cancel_rx).await;

    let _ = stop_tx.send(true);
    let _ = poller_task.await;
    printer_task.abort();

    let elapsed = format_elapsed(started.elapsed().as_secs());
    match outcome {
        Ok(summary) => {
            match summary.outcome {
                DriveOutcome::Done => println!(
                    "done: {} after {} iteration(s) in {}",
                    summary.final_stats, summary.iterations, elapsed
                ),
                DriveOutcome::Canceled => println!(
                    "canceled: {} after {} iteration(s) in {}",
                    summary.final_stats, summary.iterations, elapsed
                ),
            }
            Ok(0)
        }
        Err(e) => Ok(super::report(&e)),
    }
}

async fn print_updates(mut reader: UpdateReader) {
    while let Some(update) = reader.recv().await {
        println!("{}", update.log_summary());
    }
}
