// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    commits       = { CompletionStatus::CommitsCreated, true },
    rescued       = { CompletionStatus::Rescued, true },
    rescued_final = { CompletionStatus::RescuedFinal, true },
    nothing       = { CompletionStatus::NothingToDo, false },
    timeout       = { CompletionStatus::Timeout, false },
    probe_error   = { CompletionStatus::ProbeError, false },
    llm_stopped   = { CompletionStatus::LlmStopped, false },
)]
fn progress_statuses(status: CompletionStatus, progress: bool) {
    assert_eq!(status.is_progress(), progress);
}

#[test]
fn commits_created_constructor() {
    let result = CompletionResult::commits_created(2);
    assert!(result.complete);
    assert_eq!(result.new_commits, 2);
    assert_eq!(result.probes_used, 0);
    assert!(!result.rescued);
    assert_eq!(result.status, CompletionStatus::CommitsCreated);
}

#[test]
fn rescued_constructor_distinguishes_final_attempt() {
    let mid = CompletionResult::rescued(1, 3, false);
    assert_eq!(mid.status, CompletionStatus::Rescued);
    assert!(mid.complete && mid.rescued);

    let last = CompletionResult::rescued(1, 5, true);
    assert_eq!(last.status, CompletionStatus::RescuedFinal);
}

#[test]
fn status_serializes_snake_case() {
    let json = serde_json::to_string(&CompletionStatus::RescuedFinal).unwrap();
    assert_eq!(json, "\"rescued_final\"");
    assert_eq!(CompletionStatus::Timeout.to_string(), "timeout");
}
