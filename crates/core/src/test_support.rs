// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared by other crates' tests (feature `test-support`).

use crate::runner::{RunnerId, RunnerRecord, RunnerStatus};
use chrono::Utc;
use std::path::Path;

/// Builder for [`RunnerRecord`] fixtures.
pub struct RunnerRecordBuilder {
    record: RunnerRecord,
}

impl RunnerRecordBuilder {
    pub fn new(project: &Path, spec: &str) -> Self {
        Self {
            record: RunnerRecord {
                id: RunnerId::new(uuid::Uuid::new_v4().to_string()),
                project_path: project.to_path_buf(),
                spec_name: spec.to_string(),
                provider: "claude".to_string(),
                model: "test-model".to_string(),
                pid: 0,
                cmd_fingerprint: "claude".to_string(),
                status: RunnerStatus::Running,
                start_time: Utc::now(),
                last_activity_time: Utc::now(),
                last_retry_time: None,
                retry_count: 0,
                max_retries: 3,
                config_hash: String::new(),
                log_path: project.join("runner_0.log"),
                baseline_commit: None,
                exit_code: None,
            },
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.record.id = RunnerId::new(id);
        self
    }

    pub fn pid(mut self, pid: u32) -> Self {
        self.record.pid = pid;
        self
    }

    pub fn fingerprint(mut self, fp: impl Into<String>) -> Self {
        self.record.cmd_fingerprint = fp.into();
        self
    }

    pub fn status(mut self, status: RunnerStatus) -> Self {
        self.record.status = status;
        self
    }

    pub fn config_hash(mut self, hash: impl Into<String>) -> Self {
        self.record.config_hash = hash.into();
        self
    }

    pub fn build(self) -> RunnerRecord {
        self.record
    }
}
