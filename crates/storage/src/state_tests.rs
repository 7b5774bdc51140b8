// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use gw_core::{AdapterType, SubscribeParams, TagAttribute, TagType};

fn tag(name: &str) -> TagDelta {
    TagDelta { name: name.to_string(), address: "1!400001".to_string(), r#type: TagType::Int16, attribute: TagAttribute::READ }
}

#[test]
fn replay_builds_node_then_group_then_tag() {
    let mut state = MaterializedState::default();
    state.apply_event(&GatewayEvent::AddNode {
        name: "modbus1".to_string(),
        plugin: "modbus_tcp".to_string(),
        kind: AdapterType::Driver,
    });
    state.apply_event(&GatewayEvent::AddGroup { driver: "modbus1".to_string(), group: "fast".to_string(), interval_ms: 100 });
    state.apply_event(&GatewayEvent::AddTag { driver: "modbus1".to_string(), group: "fast".to_string(), tag: tag("t1") });

    assert!(state.nodes.contains_key("modbus1"));
    assert_eq!(state.tags_for("modbus1", "fast").len(), 1);
}

#[test]
fn del_node_cascades_to_groups_and_subscriptions() {
    let mut state = MaterializedState::default();
    state.apply_event(&GatewayEvent::AddNode { name: "modbus1".to_string(), plugin: "modbus_tcp".to_string(), kind: AdapterType::Driver });
    state.apply_event(&GatewayEvent::AddGroup { driver: "modbus1".to_string(), group: "fast".to_string(), interval_ms: 100 });
    state.apply_event(&GatewayEvent::AddSubscription {
        app: "mqtt1".to_string(),
        driver: "modbus1".to_string(),
        group: "fast".to_string(),
        params: SubscribeParams::default(),
    });

    state.apply_event(&GatewayEvent::DelNode { name: "modbus1".to_string() });

    assert!(!state.nodes.contains_key("modbus1"));
    assert!(state.groups.get("modbus1").is_none());
    assert!(state.subscriptions_for_app("mqtt1").is_empty());
}

#[test]
fn rename_node_moves_groups_and_subscription_keys() {
    let mut state = MaterializedState::default();
    state.apply_event(&GatewayEvent::AddNode { name: "modbus1".to_string(), plugin: "modbus_tcp".to_string(), kind: AdapterType::Driver });
    state.apply_event(&GatewayEvent::AddGroup { driver: "modbus1".to_string(), group: "fast".to_string(), interval_ms: 100 });
    state.apply_event(&GatewayEvent::AddSubscription {
        app: "mqtt1".to_string(),
        driver: "modbus1".to_string(),
        group: "fast".to_string(),
        params: SubscribeParams::default(),
    });

    state.apply_event(&GatewayEvent::RenameNode { name: "modbus1".to_string(), new_name: "modbus2".to_string() });

    assert!(state.nodes.contains_key("modbus2"));
    assert!(state.groups.get("modbus2").is_some());
    assert_eq!(state.subscriptions_for_app("mqtt1")[0].driver, "modbus2");
}

#[test]
fn add_subscription_is_idempotent() {
    let mut state = MaterializedState::default();
    let event = GatewayEvent::AddSubscription {
        app: "mqtt1".to_string(),
        driver: "modbus1".to_string(),
        group: "fast".to_string(),
        params: SubscribeParams::default(),
    };
    state.apply_event(&event);
    state.apply_event(&event);
    assert_eq!(state.subscriptions.len(), 1);
}

#[test]
fn state_round_trips_through_json() {
    let mut state = MaterializedState::default();
    state.apply_event(&GatewayEvent::AddNode { name: "modbus1".to_string(), plugin: "modbus_tcp".to_string(), kind: AdapterType::Driver });
    state.apply_event(&GatewayEvent::AddGroup { driver: "modbus1".to_string(), group: "fast".to_string(), interval_ms: 100 });
    state.apply_event(&GatewayEvent::AddTag { driver: "modbus1".to_string(), group: "fast".to_string(), tag: tag("t1") });

    let json = serde_json::to_string(&state).unwrap();
    let back: MaterializedState = serde_json::from_str(&json).unwrap();
    assert_eq!(back.tags_for("modbus1", "fast").len(), 1);
}
