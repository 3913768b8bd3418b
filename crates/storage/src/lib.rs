// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-storage: atomic persistence for runner state and discovery cache.
//!
//! Every write goes to a temp file, is synced, then renamed into place,
//! so a crash mid-write never leaves a half-written document. Corrupt
//! files are moved aside to a rotated `.bak` with a warning and treated
//! as empty; the daemon never refuses to start over bad state.

pub mod atomic;
pub mod cache;
pub mod paths;
pub mod state;

pub use atomic::{load_or_default, save_atomic, save_text_atomic};
pub use cache::ProjectCache;
pub use paths::{project_cache_path, runner_state_path, state_dir};
pub use state::RunnerStateFile;

use thiserror::Error;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
