// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sw projects` — discovery walk with a cache.

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;
use sw_core::Config;
use sw_engine::EngineError;
use sw_storage::{project_cache_path, ProjectCache};

/// Cache entries older than this are rebuilt.
const CACHE_MAX_AGE: Duration = Duration::from_secs(15 * 60);

#[derive(Args, Debug)]
pub struct ProjectsArgs {
    /// Ignore the cache and walk the workspace again
    #[arg(long)]
    pub refresh_cache: bool,
}

pub fn run(config: Config, args: ProjectsArgs) -> i32 {
    match list(&config, args.refresh_cache) {
        Ok(projects) => {
            for path in &projects {
                println!("{}", path.display());
            }
            0
        }
        Err(e) => super::report(&e),
    }
}

fn list(config: &Config, refresh: bool) -> Result<Vec<PathBuf>, EngineError> {
    let cache_path = project_cache_path();

    if !refresh {
        let cache = ProjectCache::load(&cache_path)?;
        if cache.is_fresh(&config.workspace_root, CACHE_MAX_AGE, chrono::Utc::now()) {
            return Ok(cache.projects.iter().cloned().collect());
        }
    }

    refresh_cache(config)?;
    let cache = ProjectCache::load(&cache_path)?;
    Ok(cache.projects.iter().cloned().collect())
}

/// Walk the workspace root and rewrite the discovery cache.
pub fn refresh_cache(config: &Config) -> Result<(), EngineError> {
    let projects = sw_probes::discover_projects(&config.workspace_root, &config.workflow_dir_name)?;
    let cache = ProjectCache::new(
        &config.workspace_root,
        projects.into_iter().map(|p| p.path),
    );
    cache.save(&project_cache_path())?;
    Ok(())
}
