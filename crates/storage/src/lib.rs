// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence layer: write-ahead log of logical deltas, periodic snapshot
//! checkpointing, and the materialized state they reconstruct.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod event;
mod snapshot;
mod state;
mod wal;

pub use event::{GatewayEvent, TagDelta};
pub use snapshot::{default_snapshot_path, load_with_fallback, Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::{GroupRecord, MaterializedState, NodeRecord, SubscriptionRecord};
pub use wal::{Wal, WalEntry, WalError};
