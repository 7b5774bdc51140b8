// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! App adapter (spec §4.5): dispatches `TRANS_DATA` to its plugin and
//! keeps a bounded local cache so a plugin that loses its downstream
//! connection can replay once it reconnects, per the plugin's
//! `CacheType`.

use std::collections::HashMap;

use gw_core::{GatewayError, SubscribeParams};
use gw_plugins::{AppPlugin, CacheType, DownstreamRequest, DownstreamResult, TagSample};
use gw_wire::{BusEvent, TagValue};
use parking_lot::Mutex;

/// Replay buffer bound per (driver, group): the reference design allows no
/// durability guarantee for in-flight telemetry beyond a bounded local
/// cache (spec §1 Non-goals), so this is a ring of the most recent ticks
/// rather than anything persisted.
const CACHE_DEPTH: usize = 16;

struct CacheEntry {
    driver: String,
    group: String,
    samples: Vec<TagSample>,
}

/// One route table entry (spec §4.5): where and how a (driver, group)'s
/// `TRANS_DATA` gets published once it reaches this app.
#[derive(Debug, Clone)]
pub struct Route {
    pub topic: String,
    pub params: SubscribeParams,
    pub qos: u8,
    pub format: String,
}

pub struct AppAdapter {
    name: String,
    plugin: std::sync::Arc<dyn AppPlugin>,
    routes: Mutex<HashMap<(String, String), Route>>,
    cache: Mutex<Vec<CacheEntry>>,
    last_published: Mutex<HashMap<(String, String), Vec<TagSample>>>,
}

impl AppAdapter {
    pub fn new(name: impl Into<String>, plugin: std::sync::Arc<dyn AppPlugin>) -> Self {
        AppAdapter {
            name: name.into(),
            plugin,
            routes: Mutex::new(HashMap::new()),
            cache: Mutex::new(Vec::new()),
            last_published: Mutex::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Forwards a `NODE_SETTING` admin request to the plugin (spec §4.5).
    pub fn apply_setting(&self, value: serde_json::Value) -> Result<(), GatewayError> {
        self.plugin.setting(value).map_err(|err| match err {
            gw_plugins::PluginError::Gateway(inner) => inner,
            _ => GatewayError::EInternal,
        })
    }

    /// Inserts or refreshes the (driver, group) route on `SUBSCRIBE_GROUP`
    /// (spec §4.5). Re-inserting the same key just updates it in place —
    /// the key itself is the dedup, since `subscribe_group` is idempotent
    /// on (driver, group, app).
    pub fn insert_route(&self, driver: &str, group: &str, route: Route) {
        self.routes.lock().insert((driver.to_string(), group.to_string()), route);
    }

    pub fn remove_route(&self, driver: &str, group: &str) {
        self.routes.lock().remove(&(driver.to_string(), group.to_string()));
    }

    pub fn route(&self, driver: &str, group: &str) -> Option<Route> {
        self.routes.lock().get(&(driver.to_string(), group.to_string())).cloned()
    }

    /// Handles one `TRANS_DATA` event: resolves the route, publishes
    /// through the plugin, and on failure (e.g. `MqttDisconnected`) retains
    /// the samples for replay. An absent route is a drop, not an error —
    /// the caller is expected to bump `SEND_MSG_ERRORS_TOTAL` on `Ok(false)`.
    pub async fn dispatch(&self, event: BusEvent) -> Result<bool, GatewayError> {
        let BusEvent::TransData { driver, group, values, timestamp: _ } = event else {
            return Ok(true);
        };
        let Some(route) = self.route(&driver, &group) else {
            tracing::warn!(app = %self.name, driver, group, "no route for this group, dropping");
            return Ok(false);
        };
        let samples: Vec<TagSample> =
            values.into_iter().map(|v| TagSample { tag: v.tag, value: v.value, timestamp: 0 }).collect();

        match self.plugin.publish(&driver, &group, &route.topic, &samples).await {
            Ok(()) => {
                self.last_published.lock().insert((driver, group), samples);
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(app = %self.name, driver, group, error = %err, "publish failed, caching for replay");
                self.push_cache(driver, group, samples);
                Err(err)
            }
        }
    }

    /// Decodes a downstream read/write via the plugin (spec §4.5).
    pub fn decode_downstream(&self, topic: &str, payload: serde_json::Value) -> Result<DownstreamRequest, GatewayError> {
        self.plugin.decode_downstream(topic, payload)
    }

    /// Re-encodes a downstream result via the plugin.
    pub fn encode_downstream_response(
        &self,
        request: &DownstreamRequest,
        result: DownstreamResult,
    ) -> Result<(String, serde_json::Value), GatewayError> {
        self.plugin.encode_downstream_response(request, result)
    }

    fn push_cache(&self, driver: String, group: String, samples: Vec<TagSample>) {
        let mut cache = self.cache.lock();
        cache.push(CacheEntry { driver, group, samples });
        if cache.len() > CACHE_DEPTH {
            cache.remove(0);
        }
    }

    /// Replays whatever the cache holds after a reconnect, honoring the
    /// plugin's `CacheType`: `Always` replays every cached tick; `OnChange`
    /// replays only values that differ from the last value successfully
    /// published for that tag.
    pub async fn replay_on_reconnect(&self) -> usize {
        let entries = std::mem::take(&mut *self.cache.lock());
        let cache_type = self.plugin.descriptor().cache_type;
        let mut replayed = 0;

        for entry in entries {
            let samples = match cache_type {
                CacheType::Always => entry.samples.clone(),
                CacheType::OnChange => {
                    let last = self.last_published.lock().get(&(entry.driver.clone(), entry.group.clone())).cloned();
                    entry
                        .samples
                        .iter()
                        .filter(|sample| {
                            last.as_ref()
                                .and_then(|prev| prev.iter().find(|p| p.tag == sample.tag))
                                .map(|prev| prev.value != sample.value)
                                .unwrap_or(true)
                        })
                        .cloned()
                        .collect()
                }
            };
            if samples.is_empty() {
                continue;
            }
            let Some(route) = self.route(&entry.driver, &entry.group) else {
                continue;
            };
            if self.plugin.publish(&entry.driver, &entry.group, &route.topic, &samples).await.is_ok() {
                self.last_published.lock().insert((entry.driver, entry.group), entry.samples);
                replayed += 1;
            }
        }
        tracing::info!(app = %self.name, replayed, "replay on reconnect complete");
        replayed
    }

    pub fn cached_tick_count(&self) -> usize {
        self.cache.lock().len()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
