// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample(classifier: &str) -> EngineError {
    match classifier {
        "task-format-invalid" => EngineError::TaskFormatInvalid { detail: "x".into() },
        "precondition-failed" => EngineError::precondition("dirty"),
        "spawn-failed" => EngineError::SpawnFailed("enoent".into()),
        _ => EngineError::Stalled { streak: 3 },
    }
}

#[yare::parameterized(
    task_format  = { "task-format-invalid" },
    precondition = { "precondition-failed" },
    spawn        = { "spawn-failed" },
    stalled      = { "stalled" },
)]
fn classifiers_are_stable_strings(classifier: &str) {
    assert_eq!(sample(classifier).classifier(), classifier);
}

#[test]
fn messages_are_human_readable_without_backtraces() {
    let err = EngineError::Stalled { streak: 3 };
    assert_eq!(
        err.to_string(),
        "stalled after 3 iterations without progress"
    );
}

#[test]
fn wrapped_errors_keep_their_own_classifiers() {
    let err = EngineError::from(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
    assert_eq!(err.classifier(), "io-error");
}
