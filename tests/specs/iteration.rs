// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end iteration scenarios.

use crate::prelude::*;
use sw_adapters::{FakeProvider, ProbeReply, ProbeStatus};
use sw_core::CompletionStatus;
use sw_engine::{DriveOutcome, EngineError};

const TWO_TASKS: &str = "\
- [ ] 1. Add foo
  - **Files**:
    - src/foo.txt
- [ ] 2. Add bar
  - **Files**:
    - src/bar.txt
";

/// The session implements both tasks, commits twice, and marks
/// them complete; the next iteration observes a finished spec.
#[tokio::test]
async fn clean_completion() {
    let w = world(TWO_TASKS);
    let session = "\
        mkdir -p src && echo foo > src/foo.txt && git add src && git commit -q -m 'add foo' && \
        echo bar > src/bar.txt && git add src && git commit -q -m 'add bar' && \
        sed -i 's/- \\[ \\]/- [x]/' .spec-workflow/specs/demo/tasks.md";
    let driver = driver(&w, FakeProvider::with_script(session));

    let summary = driver.run(&w.project, &w.spec, no_cancel()).await.unwrap();

    assert_eq!(summary.outcome, DriveOutcome::Done);
    assert_eq!(summary.final_stats.completed, 2);
    assert_eq!(summary.final_stats.total, 2);
    let completion = summary.last_completion.unwrap();
    assert_eq!(completion.status, CompletionStatus::CommitsCreated);
    assert_eq!(completion.new_commits, 2);
}

/// No new commits, the probe says complete, the tree is dirty, and
/// the rescue collaborator turns the work into a commit.
#[tokio::test]
async fn rescue_converts_uncommitted_work() {
    let w = world(TWO_TASKS);
    // The session writes the files and marks the tasks but forgets to commit
    let session = "\
        mkdir -p src && echo foo > src/foo.txt && echo bar > src/bar.txt && \
        sed -i 's/- \\[ \\]/- [x]/' .spec-workflow/specs/demo/tasks.md";
    w.probe.push(ProbeReply::with_status(ProbeStatus::Complete));
    w.probe.push(ProbeReply::with_status(ProbeStatus::Complete));

    let rescue = sw_adapters::FakeRescue::with_hook(|repo, _spec| {
        let status = std::process::Command::new("sh")
            .arg("-c")
            .arg("git add -A && git commit -q -m 'rescue: commit session work'")
            .current_dir(repo)
            .status()
            .unwrap();
        assert!(status.success());
    });
    let mut w = w;
    w.rescue = rescue;
    let driver = driver(&w, FakeProvider::with_script(session));

    let summary = driver.run(&w.project, &w.spec, no_cancel()).await.unwrap();
    assert_eq!(summary.outcome, DriveOutcome::Done);
    let completion = summary.last_completion.unwrap();
    assert!(matches!(
        completion.status,
        CompletionStatus::Rescued | CompletionStatus::CommitsCreated
    ));
    assert_eq!(w.rescue.calls().len(), 1);
}

/// Three iterations without commits or task movement stall the
/// driver with the stable classifier.
#[tokio::test]
async fn stall_after_three_empty_iterations() {
    let w = world("- [ ] 1. Never progresses\n");
    let driver = driver(&w, FakeProvider::succeeding());

    let err = driver.run(&w.project, &w.spec, no_cancel()).await.unwrap_err();
    match &err {
        EngineError::Stalled { streak } => assert_eq!(*streak, 3),
        other => panic!("expected stall, got {:?}", other),
    }
    assert_eq!(err.classifier(), "stalled");
    assert!(w.manager.list_active().is_empty(), "records are cleaned up");
}

/// A falsely-completed task is demoted in Phase 1, then promoted
/// once the implementation exists and acceptance is checked.
#[tokio::test]
async fn false_completion_reset_then_promotion() {
    let w = world(
        "\
- [x] 2 Implement repo
  - **Files**:
    - src/foo.ts
  - **Acceptance**:
    - [x] exports the repo type
",
    );
    // The session provides the missing implementation and commits it
    let session = "mkdir -p src && echo 'export {}' > src/foo.ts && \
                   git add src && git commit -q -m 'implement repo'";
    let driver = driver(&w, FakeProvider::with_script(session));

    let summary = driver.run(&w.project, &w.spec, no_cancel()).await.unwrap();

    assert_eq!(summary.outcome, DriveOutcome::Done);
    let text = std::fs::read_to_string(&w.spec.tasks_path).unwrap();
    assert!(text.contains("- [x] 2 Implement repo"));
    assert_eq!(summary.final_stats.completed, 1);
    // Phase 1 of the first iteration demoted the claim before the
    // session ran; the demotion is visible in the validation log
    let validation = std::fs::read_to_string(w.spec.phase_log_path("validation", 1)).unwrap();
    assert!(validation.contains("reset to in-progress: 2"));
}

/// An empty tasks document is already done; no subprocess ever runs.
#[tokio::test]
async fn empty_tasks_document_is_done_immediately() {
    let w = world("");
    let driver = driver(&w, FakeProvider::failing());

    let summary = driver.run(&w.project, &w.spec, no_cancel()).await.unwrap();
    assert_eq!(summary.outcome, DriveOutcome::Done);
    assert_eq!(summary.iterations, 1);
    assert_eq!(summary.final_stats.total, 0);
    assert!(w.manager.list_active().is_empty());
}
