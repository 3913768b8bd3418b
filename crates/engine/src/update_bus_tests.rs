// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::Path;
use sw_core::{RunnerId, RunnerStatus, SpecId, TaskStats};

fn spec(name: &str) -> SpecId {
    SpecId::for_spec(Path::new("/work/proj"), name)
}

fn counts(name: &str, total: usize) -> StateUpdate {
    StateUpdate::TaskCountsChanged {
        spec_id: spec(name),
        stats: TaskStats {
            pending: total,
            in_progress: 0,
            completed: 0,
            total,
        },
    }
}

fn commit(name: &str, n: u64) -> StateUpdate {
    StateUpdate::CommitObserved {
        spec_id: spec(name),
        hash: format!("{:040}", n),
        subject: format!("commit {}", n),
    }
}

#[tokio::test]
async fn updates_arrive_in_fifo_order() {
    let (bus, mut reader) = update_channel(DEFAULT_CAPACITY);
    bus.send(counts("auth", 1));
    bus.send(commit("auth", 1));
    bus.send(counts("auth", 2));

    assert_eq!(reader.recv().await, Some(counts("auth", 1)));
    assert_eq!(reader.recv().await, Some(commit("auth", 1)));
    assert_eq!(reader.recv().await, Some(counts("auth", 2)));
}

#[tokio::test]
async fn recv_returns_none_after_all_senders_drop() {
    let (bus, mut reader) = update_channel(4);
    bus.send(counts("auth", 1));
    drop(bus);

    assert_eq!(reader.recv().await, Some(counts("auth", 1)));
    assert_eq!(reader.recv().await, None);
}

#[tokio::test]
async fn full_queue_coalesces_same_spec_counts_last_writer_wins() {
    let (bus, mut reader) = update_channel(2);
    bus.send(counts("auth", 1));
    bus.send(counts("billing", 1));
    // Queue full: the stale auth counts are replaced by the newest
    bus.send(counts("auth", 9));

    assert_eq!(reader.len(), 2);
    assert_eq!(reader.recv().await, Some(counts("billing", 1)));
    assert_eq!(reader.recv().await, Some(counts("auth", 9)));
}

#[tokio::test]
async fn commits_and_runner_status_are_never_dropped() {
    let (bus, mut reader) = update_channel(1);
    bus.send(commit("auth", 1));
    bus.send(commit("auth", 2));
    bus.send(StateUpdate::RunnerStatusChanged {
        runner_id: RunnerId::new("r-1"),
        status: RunnerStatus::Crashed,
        exit_code: Some(1),
    });

    // All three are queued despite capacity 1
    assert_eq!(reader.len(), 3);
    assert_eq!(reader.recv().await, Some(commit("auth", 1)));
    assert_eq!(reader.recv().await, Some(commit("auth", 2)));
}

#[tokio::test]
async fn coalescable_update_displaces_other_coalescable_when_no_same_key() {
    let (bus, mut reader) = update_channel(1);
    bus.send(counts("auth", 1));
    // Different spec, still coalescable: displaces the oldest coalescable
    bus.send(counts("billing", 1));
    assert_eq!(reader.len(), 1);
    assert_eq!(reader.recv().await, Some(counts("billing", 1)));
}

#[tokio::test]
async fn full_queue_of_critical_updates_does_not_drop_coalescable_sends() {
    let (bus, mut reader) = update_channel(1);
    bus.send(commit("auth", 1));
    bus.send(counts("auth", 5));
    // Nothing coalescable was queued, so the new update is appended
    assert_eq!(reader.len(), 2);
    assert_eq!(reader.recv().await, Some(commit("auth", 1)));
    assert_eq!(reader.recv().await, Some(counts("auth", 5)));
}

#[tokio::test]
async fn try_recv_is_non_blocking() {
    let (bus, mut reader) = update_channel(4);
    assert_eq!(reader.try_recv(), None);
    bus.send(counts("auth", 1));
    assert_eq!(reader.try_recv(), Some(counts("auth", 1)));
}

#[tokio::test]
async fn clones_share_the_queue() {
    let (bus, mut reader) = update_channel(8);
    let clone = bus.clone();
    clone.send(counts("auth", 1));
    bus.send(counts("billing", 1));
    assert_eq!(reader.len(), 2);
    assert!(reader.recv().await.is_some());
}
