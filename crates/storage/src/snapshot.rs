// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! Snapshots store the complete materialized state at a point in time,
//! identified by the WAL sequence number it was taken at. Recovery loads
//! the snapshot, then replays WAL entries with `seq > snapshot.seq`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::MaterializedState;

pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("compression error: {0}")]
    Compression(std::io::Error),
    #[error("snapshot version {0} is newer than the current version {CURRENT_SNAPSHOT_VERSION}")]
    FutureVersion(u32),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "v")]
    pub version: u32,
    pub seq: u64,
    pub state: MaterializedState,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(seq: u64, state: MaterializedState) -> Self {
        Snapshot { version: CURRENT_SNAPSHOT_VERSION, seq, state, created_at: Utc::now() }
    }

    /// Writes the snapshot zstd-compressed to `path`, first rotating any
    /// existing file to `.bak` so a crash mid-write can't destroy the last
    /// good snapshot.
    pub fn save(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = serde_json::to_vec(self)?;
        let compressed = zstd::encode_all(json.as_slice(), 0).map_err(SnapshotError::Compression)?;

        if path.exists() {
            let bak = path.with_extension("bak");
            fs::rename(path, bak)?;
        }
        fs::write(path, compressed)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Option<Self>, SnapshotError> {
        if !path.exists() {
            return Ok(None);
        }
        let compressed = fs::read(path)?;
        let json = zstd::decode_all(compressed.as_slice()).map_err(SnapshotError::Compression)?;
        let snapshot: Snapshot = serde_json::from_slice(&json)?;
        if snapshot.version > CURRENT_SNAPSHOT_VERSION {
            return Err(SnapshotError::FutureVersion(snapshot.version));
        }
        Ok(Some(snapshot))
    }
}

/// Loads `path`, falling back to `path.bak` if the primary file is missing
/// or corrupt — mirrors the WAL's own crash-tolerance posture.
pub fn load_with_fallback(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    match Snapshot::load(path) {
        Ok(snapshot) => Ok(snapshot),
        Err(_) => Snapshot::load(&path.with_extension("bak")),
    }
}

pub fn default_snapshot_path(dir: &Path) -> PathBuf {
    dir.join("state.snapshot")
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
