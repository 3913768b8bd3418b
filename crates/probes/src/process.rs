// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process liveness checks with a PID-reuse guard.
//!
//! A bare "pid exists" check is never enough: the OS recycles pids, so
//! liveness additionally requires the process's argv to contain the
//! fingerprint recorded at spawn time.

use std::path::Path;
use std::process::Command;

/// Read a process's command line, space-joined. `None` when the process
/// does not exist or its cmdline cannot be read.
fn cmdline(pid: u32) -> Option<String> {
    let proc_path = format!("/proc/{}/cmdline", pid);
    if Path::new(&proc_path).exists() {
        let raw = std::fs::read(&proc_path).ok()?;
        let joined = raw
            .split(|b| *b == 0)
            .filter(|part| !part.is_empty())
            .map(|part| String::from_utf8_lossy(part).into_owned())
            .collect::<Vec<_>>()
            .join(" ");
        return Some(joined);
    }

    // Non-procfs platforms: best effort via ps
    let output = Command::new("ps")
        .args(["-p", &pid.to_string(), "-o", "args="])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let args = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if args.is_empty() {
        None
    } else {
        Some(args)
    }
}

/// True when `pid` exists and its argv contains `fingerprint`.
///
/// An empty fingerprint never matches; records without one cannot be
/// re-adopted safely.
pub fn pid_alive(pid: u32, fingerprint: &str) -> bool {
    if pid == 0 || fingerprint.is_empty() {
        return false;
    }
    match cmdline(pid) {
        Some(args) => args.contains(fingerprint),
        None => false,
    }
}

/// Send a signal by name (`TERM`, `KILL`) to a process.
///
/// Shells out to `kill(1)` so the crate stays free of unsafe libc
/// calls. Returns false when the signal could not be delivered.
pub fn send_signal(pid: u32, signal: &str) -> bool {
    Command::new("kill")
        .args([&format!("-{}", signal), &pid.to_string()])
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
