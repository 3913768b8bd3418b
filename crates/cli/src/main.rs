// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw - Spec Workflow runner CLI

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sw_core::Config;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "sw",
    version,
    about = "Drives AI coding sessions through spec task lists until completion"
)]
struct Cli {
    /// Path to the config file (defaults to <state dir>/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Drive one spec to completion
    Run(commands::run::RunArgs),
    /// Discover and list workspace projects
    Projects(commands::projects::ProjectsArgs),
    /// Clean up leftover state from a crashed run
    Recover,
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let config_path = cli
        .config
        .unwrap_or_else(|| sw_storage::state_dir().join("config.toml"));
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("config-error: {}", e);
            std::process::exit(1);
        }
    };

    let code = match cli.command {
        Commands::Run(args) => commands::run::run(config, args).await,
        Commands::Projects(args) => commands::projects::run(config, args),
        Commands::Recover => commands::recover::run(config),
    };
    std::process::exit(code);
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
