// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gw_core::AdapterType;
use tempfile::tempdir;

#[test]
fn save_and_load_roundtrips() {
    let dir = tempdir().unwrap();
    let path = default_snapshot_path(dir.path());

    let mut state = MaterializedState::default();
    state.apply_event(&crate::event::GatewayEvent::AddNode {
        name: "modbus1".to_string(),
        plugin: "modbus_tcp".to_string(),
        kind: AdapterType::Driver,
    });

    let snapshot = Snapshot::new(5, state);
    snapshot.save(&path).unwrap();

    let loaded = Snapshot::load(&path).unwrap().expect("snapshot should exist");
    assert_eq!(loaded.seq, 5);
    assert!(loaded.state.nodes.contains_key("modbus1"));
}

#[test]
fn load_missing_snapshot_returns_none() {
    let dir = tempdir().unwrap();
    let path = default_snapshot_path(dir.path());
    assert!(Snapshot::load(&path).unwrap().is_none());
}

#[test]
fn save_rotates_previous_snapshot_to_bak() {
    let dir = tempdir().unwrap();
    let path = default_snapshot_path(dir.path());

    Snapshot::new(1, MaterializedState::default()).save(&path).unwrap();
    Snapshot::new(2, MaterializedState::default()).save(&path).unwrap();

    assert!(path.with_extension("bak").exists());
    let loaded = Snapshot::load(&path).unwrap().unwrap();
    assert_eq!(loaded.seq, 2);
}

#[test]
fn load_with_fallback_uses_bak_when_primary_is_corrupt() {
    let dir = tempdir().unwrap();
    let path = default_snapshot_path(dir.path());

    Snapshot::new(1, MaterializedState::default()).save(&path).unwrap();
    Snapshot::new(2, MaterializedState::default()).save(&path).unwrap();

    std::fs::write(&path, b"not zstd data").unwrap();

    let loaded = load_with_fallback(&path).unwrap().expect("bak should be usable");
    assert_eq!(loaded.seq, 1);
}
