// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Commit rescue adapter.
//!
//! Rescue converts uncommitted work into commits. The caller never
//! trusts `ok` alone: after a rescue it re-verifies through the git
//! probes that a commit actually exists.

use crate::provider::{Provider, ProviderOverrides};
use crate::AdapterError;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sw_probes::run_with_timeout;
use tokio::process::Command;

/// Result of one rescue attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RescueOutcome {
    pub ok: bool,
    pub detail: String,
}

/// Turns uncommitted changes into commits.
#[async_trait]
pub trait Rescue: Send + Sync {
    async fn rescue(&self, project_path: &Path, spec_name: &str) -> Result<RescueOutcome, AdapterError>;
}

/// Rescue that runs one provider subprocess with a rescue prompt.
///
/// The prompt text is supplied by the caller (it is not part of the
/// core); `{spec}` in the template is replaced with the spec name.
pub struct CommandRescue {
    provider: Arc<dyn Provider>,
    overrides: ProviderOverrides,
    timeout: Duration,
    prompt_template: String,
}

impl CommandRescue {
    pub fn new(
        provider: Arc<dyn Provider>,
        overrides: ProviderOverrides,
        timeout: Duration,
        prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            overrides,
            timeout,
            prompt_template: prompt_template.into(),
        }
    }
}

#[async_trait]
impl Rescue for CommandRescue {
    async fn rescue(
        &self,
        project_path: &Path,
        spec_name: &str,
    ) -> Result<RescueOutcome, AdapterError> {
        let prompt = self.prompt_template.replace("{spec}", spec_name);
        let argv = self.provider.build_argv(&prompt, project_path, &self.overrides);
        let Some((program, args)) = argv.split_first() else {
            return Ok(RescueOutcome {
                ok: false,
                detail: "provider produced an empty argv".to_string(),
            });
        };

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(project_path);
        let output = run_with_timeout(cmd, self.timeout, "commit rescue").await?;

        let detail = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(RescueOutcome {
            ok: output.status.success(),
            detail,
        })
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;

    type RescueHook = dyn Fn(&Path, &str) + Send + Sync;

    /// Scripted rescue for tests. An optional hook runs on each call so
    /// tests can create real commits before the caller re-verifies.
    #[derive(Clone)]
    pub struct FakeRescue {
        ok: bool,
        hook: Option<Arc<RescueHook>>,
        calls: Arc<Mutex<Vec<(std::path::PathBuf, String)>>>,
    }

    impl FakeRescue {
        pub fn succeeding() -> Self {
            Self {
                ok: true,
                hook: None,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn failing() -> Self {
            Self {
                ok: false,
                ..Self::succeeding()
            }
        }

        /// Run `hook` on every rescue call (e.g. to `git commit`).
        pub fn with_hook(hook: impl Fn(&Path, &str) + Send + Sync + 'static) -> Self {
            Self {
                ok: true,
                hook: Some(Arc::new(hook)),
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn calls(&self) -> Vec<(std::path::PathBuf, String)> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl Rescue for FakeRescue {
        async fn rescue(
            &self,
            project_path: &Path,
            spec_name: &str,
        ) -> Result<RescueOutcome, AdapterError> {
            self.calls
                .lock()
                .push((project_path.to_path_buf(), spec_name.to_string()));
            if let Some(hook) = &self.hook {
                hook(project_path, spec_name);
            }
            Ok(RescueOutcome {
                ok: self.ok,
                detail: String::new(),
            })
        }
    }
}

#[cfg(test)]
#[path = "rescue_tests.rs"]
mod tests;
