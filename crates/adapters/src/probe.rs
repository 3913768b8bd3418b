// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Smart-completion probe adapter.
//!
//! A probe asks the session one structured question and expects a JSON
//! reply. Extraction is tolerant: a fenced JSON block is preferred,
//! then the whole reply; anything unparseable becomes a reply with
//! `status = error` rather than a fault.

use crate::provider::{Provider, ProviderOverrides};
use crate::AdapterError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use sw_probes::run_with_timeout;
use tokio::process::Command;

/// Session status as reported by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Complete,
    Waiting,
    Working,
    Error,
}

fn default_should_continue() -> bool {
    true
}

/// Structured reply from a completion probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReply {
    pub status: ProbeStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default = "default_should_continue")]
    pub should_continue: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agents_active: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks_completed: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tasks_pending: Vec<String>,
}

impl ProbeReply {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ProbeStatus::Error,
            message: message.into(),
            should_continue: true,
            agents_active: None,
            tasks_completed: Vec::new(),
            tasks_pending: Vec::new(),
        }
    }

    pub fn with_status(status: ProbeStatus) -> Self {
        Self {
            status,
            message: String::new(),
            should_continue: true,
            agents_active: None,
            tasks_completed: Vec::new(),
            tasks_pending: Vec::new(),
        }
    }
}

/// Pull the JSON payload out of a probe reply.
///
/// Prefers a fenced block (```json ... ``` or ``` ... ```); falls back
/// to the whole text.
pub fn extract_json(text: &str) -> &str {
    for fence in ["```json", "```"] {
        if let Some(open) = text.find(fence) {
            let body = &text[open + fence.len()..];
            if let Some(close) = body.find("```") {
                return body[..close].trim();
            }
        }
    }
    text.trim()
}

/// Parse a probe reply, degrading to `status = error` on bad JSON.
pub fn parse_reply(text: &str) -> ProbeReply {
    let payload = extract_json(text);
    match serde_json::from_str(payload) {
        Ok(reply) => reply,
        Err(e) => ProbeReply::error(format!("malformed probe reply: {}", e)),
    }
}

/// Asks a session whether it is done.
#[async_trait]
pub trait CompletionProbe: Send + Sync {
    async fn probe(&self, project_path: &Path) -> Result<ProbeReply, AdapterError>;
}

const PROBE_PROMPT: &str = "Report your session status. Reply with a single JSON object: \
{\"status\": \"complete\"|\"waiting\"|\"working\"|\"error\", \
\"should_continue\": bool, \"message\": string}. No prose.";

/// Probe that runs one provider subprocess per question.
pub struct CommandProbe {
    provider: Arc<dyn Provider>,
    overrides: ProviderOverrides,
    timeout: Duration,
}

impl CommandProbe {
    pub fn new(provider: Arc<dyn Provider>, overrides: ProviderOverrides, timeout: Duration) -> Self {
        Self {
            provider,
            overrides,
            timeout,
        }
    }
}

#[async_trait]
impl CompletionProbe for CommandProbe {
    async fn probe(&self, project_path: &Path) -> Result<ProbeReply, AdapterError> {
        let argv = self
            .provider
            .build_argv(PROBE_PROMPT, project_path, &self.overrides);
        let Some((program, args)) = argv.split_first() else {
            return Ok(ProbeReply::error("provider produced an empty argv"));
        };

        let mut cmd = Command::new(program);
        cmd.args(args).current_dir(project_path);
        let output = run_with_timeout(cmd, self.timeout, "completion probe").await?;

        if !output.status.success() {
            return Ok(ProbeReply::error(format!(
                "probe subprocess exited {}",
                output.status.code().unwrap_or(-1)
            )));
        }
        Ok(parse_reply(&String::from_utf8_lossy(&output.stdout)))
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    /// Scripted probe for tests: pops one queued reply per call and
    /// reports `working` once the queue drains.
    #[derive(Clone, Default)]
    pub struct FakeProbe {
        replies: Arc<Mutex<VecDeque<ProbeReply>>>,
        calls: Arc<Mutex<u32>>,
    }

    impl FakeProbe {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push(&self, reply: ProbeReply) -> &Self {
            self.replies.lock().push_back(reply);
            self
        }

        pub fn calls(&self) -> u32 {
            *self.calls.lock()
        }
    }

    #[async_trait]
    impl CompletionProbe for FakeProbe {
        async fn probe(&self, _project_path: &Path) -> Result<ProbeReply, AdapterError> {
            *self.calls.lock() += 1;
            Ok(self
                .replies
                .lock()
                .pop_front()
                .unwrap_or_else(|| ProbeReply::with_status(ProbeStatus::Working)))
        }
    }
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
