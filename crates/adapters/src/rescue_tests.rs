// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::provider::fake::FakeProvider;

#[tokio::test]
async fn command_rescue_reports_subprocess_success() {
    let provider = Arc::new(FakeProvider::succeeding());
    let rescue = CommandRescue::new(
        provider.clone(),
        ProviderOverrides::new(),
        Duration::from_secs(5),
        "Commit all staged work for {spec}.",
    );
    let dir = tempfile::tempdir().unwrap();
    let outcome = rescue.rescue(dir.path(), "auth").await.unwrap();
    assert!(outcome.ok);
    assert_eq!(
        provider.prompts(),
        vec!["Commit all staged work for auth."]
    );
}

#[tokio::test]
async fn command_rescue_reports_subprocess_failure() {
    let rescue = CommandRescue::new(
        Arc::new(FakeProvider::failing()),
        ProviderOverrides::new(),
        Duration::from_secs(5),
        "rescue {spec}",
    );
    let dir = tempfile::tempdir().unwrap();
    let outcome = rescue.rescue(dir.path(), "auth").await.unwrap();
    assert!(!outcome.ok);
}

#[tokio::test]
async fn fake_rescue_records_calls_and_runs_hook() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("rescued");
    let marker_clone = marker.clone();
    let rescue = fake::FakeRescue::with_hook(move |_project, _spec| {
        std::fs::write(&marker_clone, "ok").unwrap();
    });

    let outcome = rescue.rescue(dir.path(), "auth").await.unwrap();
    assert!(outcome.ok);
    assert!(marker.exists());
    assert_eq!(rescue.calls().len(), 1);
    assert_eq!(rescue.calls()[0].1, "auth");
}
