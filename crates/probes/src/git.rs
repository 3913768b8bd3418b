// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git repository queries.
//!
//! Fixed argument lists only; nothing here interprets repository
//! content. Every call goes through [`run_with_timeout`] with the
//! default probe timeout.

use crate::subprocess::{run_with_timeout, DEFAULT_PROBE_TIMEOUT};
use crate::ProbeError;
use std::path::{Path, PathBuf};
use tokio::process::Command;

async fn git(repo: &Path, args: &[&str]) -> Result<String, ProbeError> {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(repo);
    let what = format!("git {}", args.join(" "));
    let output = run_with_timeout(cmd, DEFAULT_PROBE_TIMEOUT, &what).await?;

    if !output.status.success() {
        return Err(ProbeError::Git {
            args: args.join(" "),
            repo: repo.to_path_buf(),
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Commit hash of the repository HEAD.
pub async fn git_head(repo: &Path) -> Result<String, ProbeError> {
    let out = git(repo, &["rev-parse", "HEAD"]).await?;
    Ok(out.trim().to_string())
}

/// Number of commits between `baseline` and HEAD.
pub async fn new_commit_count(repo: &Path, baseline: &str) -> Result<u64, ProbeError> {
    let range = format!("{}..HEAD", baseline);
    let out = git(repo, &["rev-list", &range, "--count"]).await?;
    out.trim()
        .parse()
        .map_err(|_| ProbeError::Malformed {
            what: "git rev-list --count".to_string(),
            detail: out.trim().to_string(),
        })
}

/// True when `git status --porcelain` reports nothing.
pub async fn working_tree_clean(repo: &Path) -> Result<bool, ProbeError> {
    let out = git(repo, &["status", "--porcelain"]).await?;
    Ok(out.trim().is_empty())
}

/// Paths with uncommitted changes (staged, unstaged, or untracked).
pub async fn dirty_paths(repo: &Path) -> Result<Vec<PathBuf>, ProbeError> {
    let out = git(repo, &["status", "--porcelain"]).await?;
    Ok(out
        .lines()
        .filter_map(|line| {
            // Porcelain format: two status columns, a space, then the path
            let path = line.get(3..)?.trim();
            if path.is_empty() {
                return None;
            }
            // Renames are reported as "old -> new"; keep the new path
            let path = path.rsplit(" -> ").next().unwrap_or(path);
            Some(PathBuf::from(path.trim_matches('"')))
        })
        .collect())
}

/// First line of a commit's message.
pub async fn commit_subject(repo: &Path, hash: &str) -> Result<String, ProbeError> {
    let out = git(repo, &["log", "-1", "--format=%s", hash]).await?;
    Ok(out.trim().to_string())
}

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;
