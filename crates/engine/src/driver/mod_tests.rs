// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gw_core::TagType;
use gw_plugins::ModbusDriver;
use gw_wire::BusBody;

fn new_adapter() -> (DriverAdapter, Arc<Bus>, Arc<SubscriptionManager>, Arc<ModbusDriver>) {
    let bus = Arc::new(Bus::new());
    let subscriptions = Arc::new(SubscriptionManager::new());
    let plugin = Arc::new(ModbusDriver::new());
    let adapter = DriverAdapter::new("modbus1", plugin.clone(), bus.clone(), subscriptions.clone());
    (adapter, bus, subscriptions, plugin)
}

#[tokio::test]
async fn add_gtag_commits_only_after_validation_passes() {
    let (adapter, _bus, _subs, _plugin) = new_adapter();
    adapter.add_group("fast", 100).unwrap();

    let tag = Tag::new("level", "1!400001", TagType::Uint16, TagAttribute::READ).unwrap();
    adapter.add_gtag("fast", vec![tag]).unwrap();

    assert_eq!(adapter.group("fast").unwrap().tag_count(), 1);
}

#[tokio::test]
async fn add_gtag_rejects_addresses_the_plugin_cannot_parse() {
    let (adapter, _bus, _subs, _plugin) = new_adapter();
    adapter.add_group("fast", 100).unwrap();

    // `Tag::new` only validates the addr_option suffix; point the address at
    // something the Modbus table-digit parser rejects outright.
    let mut bad_tag = Tag::new("bad", "1!400001", TagType::Uint16, TagAttribute::READ).unwrap();
    bad_tag.address = "not-an-address".to_string();

    let err = adapter.add_gtag("fast", vec![bad_tag]).unwrap_err();
    assert_eq!(err, GatewayError::GroupParameterInvalid);
    assert_eq!(adapter.group("fast").unwrap().tag_count(), 0);
}

#[tokio::test]
async fn poll_group_publishes_trans_data_to_subscribers() {
    let (adapter, bus, subs, plugin) = new_adapter();
    adapter.add_group("fast", 100).unwrap();
    let tag = Tag::new("level", "1!400001", TagType::Uint16, TagAttribute::READ).unwrap();
    adapter.add_gtag("fast", vec![tag]).unwrap();
    plugin.seed("1!400001", 77).unwrap();

    let mut mailbox = bus.register("mqtt1", 8);
    subs.sub("modbus1", "fast", "mqtt1");

    adapter.poll_group("fast").await.unwrap();

    let envelope = mailbox.try_recv().unwrap();
    match envelope.body {
        BusBody::Event(gw_wire::BusEvent::TransData { values, .. }) => {
            assert_eq!(values.len(), 1);
            assert_eq!(values[0].value, Some(serde_json::json!(77)));
        }
        other => panic!("unexpected body: {other:?}"),
    }
}

#[tokio::test]
async fn poll_group_skips_publish_when_group_has_no_pollable_tags_and_no_subscriber_wants_static() {
    let (adapter, bus, subs, _plugin) = new_adapter();
    adapter.add_group("static_only", 100).unwrap();
    let tag = Tag::new("serial", "1!400001", TagType::Uint16, TagAttribute::STATIC).unwrap();
    adapter.add_gtag("static_only", vec![tag]).unwrap();

    let mut mailbox = bus.register("mqtt1", 8);
    subs.sub("modbus1", "static_only", "mqtt1");

    adapter.poll_group("static_only").await.unwrap();
    assert!(mailbox.try_recv().is_err());
}

#[tokio::test]
async fn add_group_rejects_once_the_per_driver_cap_is_reached() {
    let (adapter, _bus, _subs, _plugin) = new_adapter();
    for i in 0..GROUP_MAX_PER_NODE {
        adapter.add_group(&format!("g{i}"), 100).unwrap();
    }
    let err = adapter.add_group("one_too_many", 100).unwrap_err();
    assert_eq!(err, GatewayError::GroupMaxGroups);
}

#[tokio::test]
async fn write_tag_rejects_read_only_tags() {
    let (adapter, _bus, _subs, _plugin) = new_adapter();
    adapter.add_group("fast", 100).unwrap();
    let tag = Tag::new("level", "1!400001", TagType::Uint16, TagAttribute::READ).unwrap();
    adapter.add_gtag("fast", vec![tag]).unwrap();

    let err = adapter.write_tag("fast", "level", serde_json::json!(1)).await.unwrap_err();
    assert_eq!(err, GatewayError::TagAttributeNotSupport);
}

#[tokio::test]
async fn write_tag_round_trips_through_the_plugin() {
    let (adapter, _bus, _subs, plugin) = new_adapter();
    adapter.add_group("fast", 100).unwrap();
    let tag = Tag::new("level", "1!400002", TagType::Uint16, TagAttribute::READ | TagAttribute::WRITE).unwrap();
    adapter.add_gtag("fast", vec![tag]).unwrap();

    adapter.write_tag("fast", "level", serde_json::json!(9)).await.unwrap();

    let read_tag = Tag::new("level", "1!400002", TagType::Uint16, TagAttribute::READ).unwrap();
    let (tx, mut rx) = mpsc::channel(1);
    plugin.group_timer("modbus1", "fast", std::slice::from_ref(&read_tag), tx).await.unwrap();
    assert_eq!(rx.recv().await.unwrap().value, Some(serde_json::json!(9)));
}
