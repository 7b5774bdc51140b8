// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use gw_plugins::PluginDescriptor;
use parking_lot::Mutex as PLMutex;
use std::sync::Arc;

#[derive(Debug)]
struct FlakyApp {
    descriptor: PluginDescriptor,
    fail_next: PLMutex<bool>,
    published: PLMutex<Vec<(String, String, Vec<TagSample>)>>,
}

#[async_trait]
impl AppPlugin for FlakyApp {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    async fn publish(&self, driver: &str, group: &str, _topic: &str, samples: &[TagSample]) -> Result<(), GatewayError> {
        if *self.fail_next.lock() {
            return Err(GatewayError::MqttDisconnected);
        }
        self.published.lock().push((driver.to_string(), group.to_string(), samples.to_vec()));
        Ok(())
    }
}

fn test_route() -> Route {
    Route { topic: "plant/modbus1/fast".to_string(), params: SubscribeParams::default(), qos: 0, format: "values".to_string() }
}

fn trans_data(tag: &str, value: i64) -> BusEvent {
    BusEvent::TransData {
        driver: "modbus1".to_string(),
        group: "fast".to_string(),
        values: vec![TagValue { tag: tag.to_string(), value: Some(serde_json::json!(value)), error: 0 }],
        timestamp: 1,
    }
}

#[tokio::test]
async fn dispatch_publishes_successfully() {
    let plugin = Arc::new(FlakyApp {
        descriptor: PluginDescriptor::app("flaky", "Flaky"),
        fail_next: PLMutex::new(false),
        published: PLMutex::new(Vec::new()),
    });
    let adapter = AppAdapter::new("mqtt1", plugin.clone());
    adapter.insert_route("modbus1", "fast", test_route());

    let published = adapter.dispatch(trans_data("level", 1)).await.unwrap();
    assert!(published);
    assert_eq!(plugin.published.lock().len(), 1);
    assert_eq!(adapter.cached_tick_count(), 0);
}

#[tokio::test]
async fn dispatch_drops_when_no_route_is_registered() {
    let plugin = Arc::new(FlakyApp {
        descriptor: PluginDescriptor::app("flaky", "Flaky"),
        fail_next: PLMutex::new(false),
        published: PLMutex::new(Vec::new()),
    });
    let adapter = AppAdapter::new("mqtt1", plugin.clone());

    let published = adapter.dispatch(trans_data("level", 1)).await.unwrap();
    assert!(!published);
    assert!(plugin.published.lock().is_empty());
}

#[tokio::test]
async fn failed_publish_is_cached_for_replay() {
    let plugin = Arc::new(FlakyApp {
        descriptor: PluginDescriptor::app("flaky", "Flaky"),
        fail_next: PLMutex::new(true),
        published: PLMutex::new(Vec::new()),
    });
    let adapter = AppAdapter::new("mqtt1", plugin.clone());
    adapter.insert_route("modbus1", "fast", test_route());

    let err = adapter.dispatch(trans_data("level", 1)).await.unwrap_err();
    assert_eq!(err, GatewayError::MqttDisconnected);
    assert_eq!(adapter.cached_tick_count(), 1);

    *plugin.fail_next.lock() = false;
    let replayed = adapter.replay_on_reconnect().await;
    assert_eq!(replayed, 1);
    assert_eq!(adapter.cached_tick_count(), 0);
    assert_eq!(plugin.published.lock().len(), 1);
}

#[tokio::test]
async fn on_change_replay_skips_values_matching_last_published() {
    let plugin = Arc::new(FlakyApp {
        descriptor: PluginDescriptor::app("flaky", "Flaky"),
        fail_next: PLMutex::new(false),
        published: PLMutex::new(Vec::new()),
    });
    let adapter = AppAdapter::new("mqtt1", plugin.clone());
    adapter.insert_route("modbus1", "fast", test_route());

    adapter.dispatch(trans_data("level", 1)).await.unwrap();

    *plugin.fail_next.lock() = true;
    adapter.dispatch(trans_data("level", 1)).await.unwrap_err();

    *plugin.fail_next.lock() = false;
    let replayed = adapter.replay_on_reconnect().await;
    assert_eq!(replayed, 0);
    assert_eq!(plugin.published.lock().len(), 1);
}
