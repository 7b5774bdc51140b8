// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gw_daemon::Manager;
use gw_engine::Reactor;
use gw_plugins::PluginRegistry;
use gw_storage::Wal;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::net::UnixListener;

async fn spawn_daemon() -> (tempfile::TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("gateway.sock");
    let wal = Wal::open(&dir.path().join("gateway.wal"), 0).unwrap();
    let manager = Arc::new(Manager::new(Arc::new(PluginRegistry::with_builtins()), Arc::new(Reactor::new(64)), wal));
    let unix = UnixListener::bind(&socket_path).unwrap();
    let listener = gw_daemon::Listener::new(unix, manager);
    tokio::spawn(listener.run());
    (dir, socket_path)
}

#[tokio::test]
async fn ping_round_trips_over_the_socket() {
    let (_dir, socket_path) = spawn_daemon().await;
    let client = GatewayClient::new(socket_path);
    let response = client.send(Request::Ping).await.unwrap();
    assert_eq!(response, Response::Pong);
}

#[tokio::test]
async fn connecting_to_a_missing_socket_is_a_connect_error() {
    let dir = tempdir().unwrap();
    let client = GatewayClient::new(dir.path().join("nope.sock"));
    let err = client.send(Request::Ping).await.unwrap_err();
    assert!(matches!(err, ClientError::Connect { .. }));
}
