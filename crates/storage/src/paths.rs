// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Well-known state file locations.
//!
//! `SW_STATE_DIR` overrides everything (tests and multi-instance
//! setups); otherwise the platform state directory is used.

use std::path::PathBuf;

const STATE_DIR_ENV: &str = "SW_STATE_DIR";

/// Directory holding all persistent runner state for this host.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("sw")
}

/// Path of the per-host runner state file.
pub fn runner_state_path() -> PathBuf {
    state_dir().join("runner_state.json")
}

/// Path of the project discovery cache.
pub fn project_cache_path() -> PathBuf {
    state_dir().join("project_cache.json")
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
