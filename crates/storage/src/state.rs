// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-host runner state file.

use crate::{atomic, StorageError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use sw_core::RunnerRecord;

/// One JSON document per host holding every active runner record.
///
/// The runner manager owns this file; persistence is a snapshot of its
/// in-memory map, not a shared mutable store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunnerStateFile {
    #[serde(default)]
    pub runners: Vec<RunnerRecord>,
}

impl RunnerStateFile {
    pub fn new(runners: Vec<RunnerRecord>) -> Self {
        Self { runners }
    }

    /// Save atomically.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        atomic::save_atomic(path, self)
    }

    /// Load, treating a missing or corrupt file as empty.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        atomic::load_or_default(path)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
