// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI subcommand implementations.

pub mod projects;
pub mod recover;
pub mod run;

use sw_engine::EngineError;

/// Map an engine error to a stable process exit code, printing the
/// machine-readable classifier and a human message to stderr.
pub(crate) fn report(err: &EngineError) -> i32 {
    eprintln!("{}: {}", err.classifier(), err);
    match err.classifier() {
        "precondition-failed" => 2,
        "task-format-invalid" => 3,
        "stalled" => 4,
        _ => 1,
    }
}
