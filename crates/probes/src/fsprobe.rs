// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem polling primitives: mtime checks and bounded log tails.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use sw_taskdoc::FileProbe;

/// Modification time of a path, or `None` if it cannot be read.
pub fn mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Read at most `max_bytes` from the end of a file.
///
/// Lossy on rotation: when the file shrinks between polls the caller's
/// offset bookkeeping resets and intermediate bytes are gone. Consumers
/// must accept truncation.
pub fn tail(path: &Path, max_bytes: u64) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    let start = size.saturating_sub(max_bytes);
    file.seek(SeekFrom::Start(start))?;
    let mut buf = Vec::with_capacity((size - start) as usize);
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

/// Read the bytes appended past `offset`, capped at `max_bytes` from
/// the end. Returns the new suffix and the file's current size.
///
/// When the file shrank (rotation), the offset is discarded and the
/// last `max_bytes` of the new content are returned.
pub fn tail_from(path: &Path, offset: u64, max_bytes: u64) -> std::io::Result<(Vec<u8>, u64)> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();
    let start = if size < offset {
        size.saturating_sub(max_bytes)
    } else {
        offset.max(size.saturating_sub(max_bytes))
    };
    file.seek(SeekFrom::Start(start))?;
    let mut buf = Vec::with_capacity((size - start) as usize);
    file.read_to_end(&mut buf)?;
    Ok((buf, size))
}

/// Existence probe rooted at a project directory.
///
/// Task documents declare workspace-relative paths; this resolves them
/// against the project root. Absolute paths are checked as-is.
#[derive(Debug, Clone)]
pub struct WorkspaceFiles {
    root: PathBuf,
}

impl WorkspaceFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileProbe for WorkspaceFiles {
    fn exists(&self, path: &Path) -> bool {
        if path.is_absolute() {
            path.exists()
        } else {
            self.root.join(path).exists()
        }
    }
}

#[cfg(test)]
#[path = "fsprobe_tests.rs"]
mod tests;
