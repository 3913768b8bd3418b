// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project discovery cache.
//!
//! Discovery is a filesystem walk; the cache lets the CLI skip it when
//! the workspace root is unchanged and the cache is young enough. The
//! root digest ties the cache to the root it was built from.

use crate::{atomic, StorageError};
use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Cached project discovery results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectCache {
    pub root: PathBuf,
    pub root_digest: String,
    pub saved_at: Option<DateTime<Utc>>,
    /// Discovered project paths, in discovery order
    #[serde(default)]
    pub projects: IndexSet<PathBuf>,
}

impl ProjectCache {
    pub fn new(root: &Path, projects: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            root: root.to_path_buf(),
            root_digest: root_digest(root),
            saved_at: Some(Utc::now()),
            projects: projects.into_iter().collect(),
        }
    }

    /// Usable for `root` and no older than `max_age`.
    pub fn is_fresh(&self, root: &Path, max_age: Duration, now: DateTime<Utc>) -> bool {
        if self.root_digest != root_digest(root) {
            return false;
        }
        match self.saved_at {
            Some(saved_at) => {
                let age = now.signed_duration_since(saved_at);
                age >= chrono::TimeDelta::zero()
                    && age.to_std().map(|a| a <= max_age).unwrap_or(false)
            }
            None => false,
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        atomic::save_atomic(path, self)
    }

    pub fn load(path: &Path) -> Result<Self, StorageError> {
        atomic::load_or_default(path)
    }
}

/// Stable digest of a workspace root path.
pub fn root_digest(root: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(root.display().to_string().as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        use std::fmt::Write;
        let _ = write!(out, "{:02x}", b);
    }
    out
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
