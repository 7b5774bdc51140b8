// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gw_core::AdapterType;
use gw_plugins::PluginRegistry;
use gw_engine::Reactor;
use gw_storage::Wal;
use tempfile::tempdir;
use tokio::net::UnixStream;

async fn spawn_listener() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let socket_path = dir.path().join("gateway.sock");
    let wal = Wal::open(&dir.path().join("gateway.wal"), 0).unwrap();
    let manager = Arc::new(Manager::new(Arc::new(PluginRegistry::with_builtins()), Arc::new(Reactor::new(64)), wal));
    let unix = UnixListener::bind(&socket_path).unwrap();
    let listener = Listener::new(unix, manager);
    tokio::spawn(listener.run());
    (dir, socket_path)
}

async fn roundtrip(socket_path: &std::path::Path, request: Request) -> Response {
    let mut stream = UnixStream::connect(socket_path).await.unwrap();
    write_framed(&mut stream, &request, REQUEST_TIMEOUT).await.unwrap();
    read_framed(&mut stream, REQUEST_TIMEOUT).await.unwrap()
}

#[tokio::test]
async fn ping_returns_pong() {
    let (_dir, socket_path) = spawn_listener().await;
    let response = roundtrip(&socket_path, Request::Ping).await;
    assert_eq!(response, Response::Pong);
}

#[tokio::test]
async fn add_node_then_get_node_round_trips_over_the_socket() {
    let (_dir, socket_path) = spawn_listener().await;
    let add = Request::AddNode { name: "d1".to_string(), plugin: "modbus_tcp".to_string(), kind: AdapterType::Driver };
    assert_eq!(roundtrip(&socket_path, add).await, Response::ok());

    let Response::Nodes { nodes } = roundtrip(&socket_path, Request::GetNode).await else { panic!("expected Nodes") };
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].name, "d1");
}

#[tokio::test]
async fn unknown_plugin_surfaces_as_an_error_response() {
    let (_dir, socket_path) = spawn_listener().await;
    let add = Request::AddNode { name: "d1".to_string(), plugin: "nope".to_string(), kind: AdapterType::Driver };
    let response = roundtrip(&socket_path, add).await;
    assert!(!response.is_success());
}
