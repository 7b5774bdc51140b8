// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end scenarios over a real `Manager` + reactor, exercising the
//! whole admin surface the way `gatewayctl` would drive it.

use std::sync::Arc;
use std::time::Duration;

use gw_core::{AdapterType, GatewayError, SubscribeParams, TagAttribute, TagType};
use gw_daemon::manager::DriverSpec;
use gw_daemon::Manager;
use gw_engine::Reactor;
use gw_plugins::{DriverPlugin, MqttApp, PluginRegistry, ModbusDriver};
use gw_storage::Wal;
use gw_wire::TagSpec;
use tempfile::tempdir;

/// A registry whose `modbus_tcp`/`mqtt` factories always hand back the same
/// shared instance, so a test can seed/inspect the plugin underneath
/// whatever node name the admin surface gave it.
fn shared_registry() -> (PluginRegistry, Arc<ModbusDriver>, Arc<MqttApp>) {
    let modbus = Arc::new(ModbusDriver::new());
    let mqtt = Arc::new(MqttApp::new());
    let registry = PluginRegistry::new();
    let shared_modbus = modbus.clone();
    registry.register_driver("modbus_tcp", move || shared_modbus.clone());
    let shared_mqtt = mqtt.clone();
    registry.register_app("mqtt", move || shared_mqtt.clone());
    (registry, modbus, mqtt)
}

fn new_manager() -> (Manager, Arc<ModbusDriver>, Arc<MqttApp>, tempfile::TempDir) {
    let dir = tempdir().unwrap();
    let wal = Wal::open(&dir.path().join("gateway.wal"), 0).unwrap();
    let (registry, modbus, mqtt) = shared_registry();
    let manager = Manager::new(Arc::new(registry), Arc::new(Reactor::new(64)), wal);
    (manager, modbus, mqtt, dir)
}

async fn wait_until(mut check: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// S1 — simple subscribe + publish: a driver's polled value reaches its
/// subscribed app's published output within two poll intervals, and the
/// per-driver rolling poll-error metric stays registered at zero.
#[tokio::test]
async fn s1_simple_subscribe_and_publish() {
    let (manager, modbus, mqtt, _dir) = new_manager();

    manager.add_node("d1", "modbus_tcp", AdapterType::Driver).await.unwrap();
    manager.add_node("a1", "mqtt", AdapterType::App).await.unwrap();

    manager.add_group("d1", "g1", 50).unwrap();
    let tag = TagSpec { name: "t1".to_string(), address: "1!400001#BB".to_string(), r#type: TagType::Int16, attribute: TagAttribute::READ };
    manager.add_gtag("d1", "g1", 50, vec![tag]).unwrap();
    modbus.seed("1!400001", 42).unwrap();

    manager
        .subscribe_group("a1", "d1", "g1", SubscribeParams { send_when_static: false, topic: Some("/x".to_string()) })
        .unwrap();
    manager.node_ctl("d1", true).unwrap();

    let published = wait_until(|| !mqtt.published().is_empty(), Duration::from_millis(500)).await;
    assert!(published, "expected a1 to publish within two poll intervals");

    let message = mqtt.published().into_iter().next().unwrap();
    assert_eq!(message.topic, "/x");
    assert_eq!(message.payload.get("t1").and_then(|v| v.as_i64()), Some(42));

    let metrics = manager.metrics().render_prometheus();
    assert!(metrics.contains("gw_driver_poll_errors_total_d1"));
}

/// S2 — driver delete cascade: deleting a driver tears down its
/// subscriptions, and re-adding a node with the same name does not
/// resurrect them.
#[tokio::test]
async fn s2_driver_delete_cascades_subscriptions() {
    let (manager, _modbus, _mqtt, _dir) = new_manager();

    manager.add_node("d1", "modbus_tcp", AdapterType::Driver).await.unwrap();
    manager.add_node("a1", "mqtt", AdapterType::App).await.unwrap();
    manager.add_group("d1", "g1", 1000).unwrap();
    manager
        .subscribe_group("a1", "d1", "g1", SubscribeParams { send_when_static: false, topic: Some("/x".to_string()) })
        .unwrap();

    let gw_wire::Response::Subscriptions { subscriptions } = manager.get_sub_group("a1") else { panic!("expected Subscriptions") };
    assert_eq!(subscriptions.len(), 1);

    manager.del_node("d1").await.unwrap();
    let gw_wire::Response::Subscriptions { subscriptions } = manager.get_sub_group("a1") else { panic!("expected Subscriptions") };
    assert!(subscriptions.is_empty());

    manager.add_node("d1", "modbus_tcp", AdapterType::Driver).await.unwrap();
    let gw_wire::Response::Subscriptions { subscriptions } = manager.get_sub_group("a1") else { panic!("expected Subscriptions") };
    assert!(subscriptions.is_empty(), "re-adding the driver must not auto-resubscribe");
}

/// S3 — change-detection correctness: a tag added to a running group is
/// visible to the very next poll, not dropped by a stale cached plan.
#[tokio::test]
async fn s3_tag_added_after_start_is_visible_on_the_next_poll() {
    let (manager, modbus, mqtt, _dir) = new_manager();

    manager.add_node("d1", "modbus_tcp", AdapterType::Driver).await.unwrap();
    manager.add_node("a1", "mqtt", AdapterType::App).await.unwrap();
    manager.add_group("d1", "g1", 10).unwrap();
    let first = TagSpec { name: "t1".to_string(), address: "1!400001".to_string(), r#type: TagType::Uint16, attribute: TagAttribute::READ };
    manager.add_gtag("d1", "g1", 10, vec![first]).unwrap();
    modbus.seed("1!400001", 1).unwrap();
    manager
        .subscribe_group("a1", "d1", "g1", SubscribeParams { send_when_static: false, topic: Some("/x".to_string()) })
        .unwrap();
    manager.node_ctl("d1", true).unwrap();

    wait_until(|| !mqtt.published().is_empty(), Duration::from_millis(500)).await;

    let second = TagSpec { name: "t2".to_string(), address: "1!400002".to_string(), r#type: TagType::Uint16, attribute: TagAttribute::READ };
    manager.add_gtag("d1", "g1", 10, vec![second]).unwrap();
    modbus.seed("1!400002", 2).unwrap();

    let both_seen = wait_until(
        || mqtt.published().iter().any(|m| m.payload.get("t1").is_some() && m.payload.get("t2").is_some()),
        Duration::from_millis(500),
    )
    .await;
    assert!(both_seen, "a poll after the add must carry both tags");
}

/// S4 — atomic batch add: one bad plugin name in a batch rolls back every
/// node the batch had already committed.
#[tokio::test]
async fn s4_add_drivers_rolls_back_the_whole_batch_on_failure() {
    let (manager, _modbus, _mqtt, _dir) = new_manager();

    let specs = vec![
        DriverSpec { name: "d1".to_string(), plugin: "modbus_tcp".to_string() },
        DriverSpec { name: "d2".to_string(), plugin: "no_such_plugin".to_string() },
        DriverSpec { name: "d3".to_string(), plugin: "modbus_tcp".to_string() },
    ];
    let err = manager.add_drivers(specs).await.unwrap_err();
    assert_eq!(err, GatewayError::LibraryNotFound);

    let gw_wire::Response::Nodes { nodes } = manager.get_node() else { panic!("expected Nodes") };
    assert!(nodes.is_empty(), "none of the batch's nodes should survive a mid-batch failure");
}

/// S5 — write round-trip: a write lands on the simulated device and reads
/// back through the normal poll path.
#[tokio::test]
async fn s5_write_tag_round_trips_through_the_driver() {
    let (manager, modbus, _mqtt, _dir) = new_manager();

    manager.add_node("d1", "modbus_tcp", AdapterType::Driver).await.unwrap();
    manager.add_group("d1", "g1", 1000).unwrap();
    let tag = TagSpec {
        name: "t1".to_string(),
        address: "1!400001".to_string(),
        r#type: TagType::Uint16,
        attribute: TagAttribute::READ | TagAttribute::WRITE,
    };
    manager.add_gtag("d1", "g1", 1000, vec![tag]).unwrap();

    manager.write_tag("d1", "g1", "t1", serde_json::json!(42)).await.unwrap();

    let (tx, mut rx) = tokio::sync::mpsc::channel(1);
    let read_tag = gw_core::Tag::new("t1", "1!400001", TagType::Uint16, TagAttribute::READ).unwrap();
    modbus.group_timer("d1", "g1", std::slice::from_ref(&read_tag), tx).await.unwrap();
    let update = rx.recv().await.unwrap();
    assert_eq!(update.value, Some(serde_json::json!(42)));
}

/// S6 — empty-topic rejection: subscribing an MQTT app with an empty topic
/// is rejected at the subscribe boundary rather than accepted and silently
/// failing at publish time.
#[tokio::test]
async fn s6_empty_topic_is_rejected() {
    let (manager, _modbus, _mqtt, _dir) = new_manager();
    manager.add_node("d1", "modbus_tcp", AdapterType::Driver).await.unwrap();
    manager.add_node("a1", "mqtt", AdapterType::App).await.unwrap();
    manager.add_group("d1", "g1", 1000).unwrap();

    let err = manager
        .subscribe_group("a1", "d1", "g1", SubscribeParams { send_when_static: false, topic: Some(String::new()) })
        .unwrap_err();
    assert_eq!(err, GatewayError::MqttSubscribeFailure);

    let gw_wire::Response::Subscriptions { subscriptions } = manager.get_sub_group("a1") else { panic!("expected Subscriptions") };
    assert!(subscriptions.is_empty());
}
