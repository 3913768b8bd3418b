// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scoped repository-local commit gate.
//!
//! During Phase 2 a `pre-commit` hook blocks human-invoked commits in
//! the project repository. Any pre-existing hook is backed up on enter
//! and restored bit-for-bit on exit. The installed hook body carries a
//! stable sentinel so a recovery sweep after a crashed run can tell our
//! hook from a user's.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Stable marker token embedded in the installed hook body.
pub const GATE_SENTINEL: &str = "sw-commit-gate";

/// Env var set on supervised children so their commits pass the gate.
pub const GATE_BYPASS_ENV: &str = "SW_COMMIT_GATE_BYPASS";

fn hooks_dir(repo: &Path) -> PathBuf {
    repo.join(".git").join("hooks")
}

fn hook_path(repo: &Path) -> PathBuf {
    hooks_dir(repo).join("pre-commit")
}

fn hook_body() -> String {
    format!(
        "#!/bin/sh\n\
         # {}: installed while an implementation session is active\n\
         [ -n \"${}\" ] && exit 0\n\
         echo \"sw: commits are gated while an implementation session is running\" >&2\n\
         exit 1\n",
        GATE_SENTINEL, GATE_BYPASS_ENV
    )
}

fn is_our_hook(path: &Path) -> bool {
    fs::read_to_string(path)
        .map(|body| body.contains(GATE_SENTINEL))
        .unwrap_or(false)
}

/// Install the gate. An existing foreign hook is renamed to
/// `pre-commit.bak-<nonce>` first.
pub fn enter(repo: &Path) -> io::Result<()> {
    let hooks = hooks_dir(repo);
    fs::create_dir_all(&hooks)?;

    let hook = hook_path(repo);
    if hook.exists() && !is_our_hook(&hook) {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let backup = hooks.join(format!("pre-commit.bak-{}", &nonce[..8]));
        fs::rename(&hook, &backup)?;
    }

    fs::write(&hook, hook_body())?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&hook, fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// Remove the gate and restore the newest backup, if any.
///
/// Idempotent; safe to call when `enter` was never called. A foreign
/// hook in the slot is left untouched.
pub fn exit(repo: &Path) -> io::Result<()> {
    let hook = hook_path(repo);
    if hook.exists() {
        if !is_our_hook(&hook) {
            return Ok(());
        }
        fs::remove_file(&hook)?;
    }

    if let Some(backup) = newest_backup(repo)? {
        fs::rename(&backup, &hook)?;
    }
    Ok(())
}

fn newest_backup(repo: &Path) -> io::Result<Option<PathBuf>> {
    let hooks = hooks_dir(repo);
    let entries = match fs::read_dir(&hooks) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if !name.to_string_lossy().starts_with("pre-commit.bak-") {
            continue;
        }
        let mtime = entry
            .metadata()
            .and_then(|m| m.modified())
            .unwrap_or(std::time::UNIX_EPOCH);
        if newest.as_ref().map(|(t, _)| mtime >= *t).unwrap_or(true) {
            newest = Some((mtime, entry.path()));
        }
    }
    Ok(newest.map(|(_, path)| path))
}

/// Recovery sweep for a leftover gate from a crashed run.
///
/// Returns true when a sentinel hook was found and cleaned up.
pub fn recover(repo: &Path) -> io::Result<bool> {
    let hook = hook_path(repo);
    if hook.exists() && is_our_hook(&hook) {
        exit(repo)?;
        return Ok(true);
    }
    Ok(false)
}

/// RAII guard wiring `exit` to every Phase-2 exit path, panics included.
pub struct GateGuard {
    repo: PathBuf,
    armed: bool,
}

impl GateGuard {
    pub fn enter(repo: &Path) -> io::Result<Self> {
        enter(repo)?;
        Ok(Self {
            repo: repo.to_path_buf(),
            armed: true,
        })
    }

    /// Remove the gate now, reporting errors to the caller. Drop is the
    /// fallback for non-straight-line exits.
    pub fn release(mut self) -> io::Result<()> {
        self.armed = false;
        exit(&self.repo)
    }
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = exit(&self.repo) {
                warn!(repo = %self.repo.display(), error = %e, "failed to remove commit gate");
            }
        }
    }
}

#[cfg(test)]
#[path = "commit_gate_tests.rs"]
mod tests;
