// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout-capped subprocess execution.

use crate::ProbeError;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for OS-level probe calls.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Run a subprocess with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`. The child is
/// killed automatically when the timeout elapses (via the tokio `Child`
/// drop implementation).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    what: &str,
) -> Result<Output, ProbeError> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(source)) => Err(ProbeError::Io {
            what: what.to_string(),
            source,
        }),
        Err(_elapsed) => Err(ProbeError::Timeout {
            what: what.to_string(),
            secs: timeout.as_secs(),
        }),
    }
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
