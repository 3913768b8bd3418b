// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sw-probes: thin, timeout-capped layer over the OS.
//!
//! Git queries, mtime polling, log tailing, process liveness, and the
//! project discovery scan. Every subprocess call carries an explicit
//! timeout and yields a typed error on breach; nothing here blocks
//! indefinitely.

pub mod discover;
pub mod fsprobe;
pub mod git;
pub mod process;
pub mod subprocess;

pub use discover::{discover_projects, list_specs};
pub use fsprobe::{mtime, tail, WorkspaceFiles};
pub use git::{commit_subject, dirty_paths, git_head, new_commit_count, working_tree_clean};
pub use process::{pid_alive, send_signal};
pub use subprocess::{run_with_timeout, DEFAULT_PROBE_TIMEOUT};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from OS probes.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{what} timed out after {secs}s")]
    Timeout { what: String, secs: u64 },
    #[error("{what} failed: {source}")]
    Io {
        what: String,
        source: std::io::Error,
    },
    #[error("git {args} in {repo} exited {code}: {stderr}")]
    Git {
        args: String,
        repo: PathBuf,
        code: i32,
        stderr: String,
    },
    #[error("unexpected output from {what}: {detail}")]
    Malformed { what: String, detail: String },
}
