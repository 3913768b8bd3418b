// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured JSON activity log.
//!
//! One JSON object per line: `{"ts", "level", "event", "ctx"}`. The
//! sink is size-bounded with numbered backups. Values under keys that
//! look like secrets are redacted before serialization. Append failures
//! degrade to a tracing warning; logging must never break the engine.

use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde_json::{json, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::warn;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static SECRET_KEYS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(api[_-]?key|token|secret|authorization|password|credentials?)$")
        .expect("constant regex pattern is valid")
});

const REDACTED: &str = "[redacted]";

/// Append-only JSON event log with rotation.
pub struct ActivityLog {
    path: PathBuf,
    max_bytes: u64,
    backups: u32,
}

impl ActivityLog {
    /// Default sink: 4 MiB per file, 3 backups.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_rotation(path, 4 * 1024 * 1024, 3)
    }

    pub fn with_rotation(path: impl Into<PathBuf>, max_bytes: u64, backups: u32) -> Self {
        Self {
            path: path.into(),
            max_bytes,
            backups,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self, event: &str, ctx: Value) {
        self.append("info", event, ctx);
    }

    pub fn warn(&self, event: &str, ctx: Value) {
        self.append("warn", event, ctx);
    }

    /// Append one event line. Failures are logged, not propagated.
    pub fn append(&self, level: &str, event: &str, ctx: Value) {
        let line = json!({
            "ts": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "level": level,
            "event": event,
            "ctx": redact(ctx),
        });
        if let Err(e) = self.write_line(&line) {
            warn!(path = %self.path.display(), error = %e, "failed to write activity log");
        }
    }

    fn write_line(&self, line: &Value) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        self.rotate_if_needed()?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    fn rotate_if_needed(&self) -> std::io::Result<()> {
        let size = match fs::metadata(&self.path) {
            Ok(meta) => meta.len(),
            Err(_) => return Ok(()),
        };
        if size < self.max_bytes || self.backups == 0 {
            return Ok(());
        }

        let numbered = |n: u32| PathBuf::from(format!("{}.{}", self.path.display(), n));
        let oldest = numbered(self.backups);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }
        for n in (1..self.backups).rev() {
            let src = numbered(n);
            if src.exists() {
                fs::rename(&src, numbered(n + 1))?;
            }
        }
        fs::rename(&self.path, numbered(1))?;
        Ok(())
    }
}

/// Replace values under secret-looking keys, recursively.
fn redact(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, val)| {
                    if SECRET_KEYS.is_match(&key) {
                        (key, Value::String(REDACTED.to_string()))
                    } else {
                        (key, redact(val))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(redact).collect()),
        other => other,
    }
}

#[cfg(test)]
#[path = "activity_log_tests.rs"]
mod tests;
