// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded update channel between the poller and the UI consumer.
//!
//! A shared ring guarded by a mutex plus a capacity-1 wake channel.
//! Under backpressure the oldest coalescable update for the same spec
//! is replaced last-writer-wins; `CommitObserved`, `RunnerStatusChanged`
//! and `ProjectSetChanged` are never dropped — for those the capacity
//! is a soft bound. FIFO order is preserved otherwise.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use sw_core::StateUpdate;
use tokio::sync::mpsc;

/// Default queue capacity.
pub const DEFAULT_CAPACITY: usize = 256;

struct Shared {
    queue: Mutex<VecDeque<StateUpdate>>,
    capacity: usize,
}

/// Sending half. Clone freely; all clones share the queue.
#[derive(Clone)]
pub struct UpdateBus {
    shared: Arc<Shared>,
    wake_tx: mpsc::Sender<()>,
}

/// Receiving half, held by the single consumer thread.
pub struct UpdateReader {
    shared: Arc<Shared>,
    wake_rx: mpsc::Receiver<()>,
}

/// Create a connected bus/reader pair.
pub fn update_channel(capacity: usize) -> (UpdateBus, UpdateReader) {
    let shared = Arc::new(Shared {
        queue: Mutex::new(VecDeque::new()),
        capacity,
    });
    let (wake_tx, wake_rx) = mpsc::channel(1);
    (
        UpdateBus {
            shared: Arc::clone(&shared),
            wake_tx,
        },
        UpdateReader { shared, wake_rx },
    )
}

impl UpdateBus {
    /// Enqueue an update, coalescing under backpressure.
    pub fn send(&self, update: StateUpdate) {
        let key = update
            .coalesce_key()
            .map(|(kind, spec)| (kind, spec.clone()));
        {
            let mut queue = self.shared.queue.lock();
            if queue.len() >= self.shared.capacity {
                if let Some(key) = &key {
                    let same_key = queue.iter().position(|queued| {
                        queued.coalesce_key().map(|(kind, spec)| (kind, spec.clone()))
                            == Some((key.0, key.1.clone()))
                    });
                    let victim =
                        same_key.or_else(|| queue.iter().position(StateUpdate::is_coalescable));
                    if let Some(pos) = victim {
                        queue.remove(pos);
                    }
                }
                // Non-coalescable updates push past the bound
            }
            queue.push_back(update);
        }
        // Non-blocking wake; a full wake channel means the reader is
        // already scheduled
        let _ = self.wake_tx.try_send(());
    }

    pub fn send_all(&self, updates: impl IntoIterator<Item = StateUpdate>) {
        for update in updates {
            self.send(update);
        }
    }
}

impl UpdateReader {
    /// Wait for and return the next update.
    ///
    /// Returns `None` once every `UpdateBus` clone is dropped and the
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<StateUpdate> {
        loop {
            if let Some(update) = self.shared.queue.lock().pop_front() {
                return Some(update);
            }
            if self.wake_rx.recv().await.is_none() {
                return self.shared.queue.lock().pop_front();
            }
        }
    }

    /// Non-blocking pop.
    pub fn try_recv(&mut self) -> Option<StateUpdate> {
        self.shared.queue.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.shared.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "update_bus_tests.rs"]
mod tests;
