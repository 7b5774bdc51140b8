// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence glue between the daemon and `gw-storage` (spec §6): loads a
//! snapshot plus whatever WAL entries postdate it at startup so
//! [`Manager::replay`] can rebuild live state, and runs a background task
//! that periodically checkpoints that state back into a snapshot and
//! truncates the WAL.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use gw_storage::{default_snapshot_path, load_with_fallback, MaterializedState, Snapshot, SnapshotError, Wal, WalError};
use thiserror::Error;

use crate::manager::Manager;

pub const DEFAULT_CHECKPOINT_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("wal error: {0}")]
    Wal(#[from] WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Opens the WAL at `dir/gateway.wal`, loads the latest snapshot (if any,
/// falling back to its `.bak` copy), and merges in any WAL entries newer
/// than the snapshot's sequence number. The returned `Wal` is ready for
/// ongoing appends; the returned state is what `Manager::replay` rebuilds
/// live nodes/groups/tags/subscriptions from.
pub fn load(dir: &Path) -> Result<(Wal, MaterializedState), PersistenceError> {
    let snapshot_path = default_snapshot_path(dir);
    let snapshot = load_with_fallback(&snapshot_path)?;
    let (processed_seq, mut state) = match snapshot {
        Some(snapshot) => (snapshot.seq, snapshot.state),
        None => (0, MaterializedState::default()),
    };

    let wal_path = dir.join("gateway.wal");
    let wal = Wal::open(&wal_path, processed_seq)?;
    for entry in wal.entries_after(processed_seq)? {
        state.apply_event(&entry.event);
    }

    Ok((wal, state))
}

/// Snapshots the manager's current materialized state to `dir` and, on
/// success, truncates the WAL up through the checkpointed sequence. A
/// no-op when nothing has been appended yet, so an idle daemon doesn't
/// grind out an empty snapshot every interval.
pub fn checkpoint_once(manager: &Manager, dir: &Path) {
    let (seq, state) = manager.checkpoint_source();
    if seq == 0 {
        return;
    }
    let snapshot = Snapshot::new(seq, state);
    match snapshot.save(&default_snapshot_path(dir)) {
        Ok(()) => manager.truncate_wal_before(seq + 1),
        Err(err) => tracing::error!(error = %err, "failed to save checkpoint snapshot"),
    }
}

/// Spawns the background checkpoint task (mirrors the teacher's
/// interval-driven collector task shape): ticks every `interval` and calls
/// [`checkpoint_once`].
pub fn spawn_checkpointer(manager: Arc<Manager>, dir: PathBuf, interval: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            checkpoint_once(&manager, &dir);
        }
    });
}

#[cfg(test)]
#[path = "persistence_tests.rs"]
mod tests;
