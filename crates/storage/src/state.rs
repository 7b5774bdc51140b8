// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state built by replaying [`GatewayEvent`]s.

use std::collections::HashMap;

use gw_core::{AdapterType, SubscribeParams};
use serde::{Deserialize, Serialize};

use crate::event::{GatewayEvent, TagDelta};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub name: String,
    pub plugin: String,
    pub kind: AdapterType,
    #[serde(default)]
    pub setting: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupRecord {
    pub name: String,
    pub interval_ms: u32,
    #[serde(default)]
    pub tags: HashMap<String, TagDelta>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionRecord {
    pub app: String,
    pub driver: String,
    pub group: String,
    pub params: SubscribeParams,
}

/// Replayed state, built in the fixed order **nodes → settings → groups →
/// tags → subscriptions** (spec §6). Because events already carry that
/// order implicitly (a group can't be added before its node, a tag can't
/// be added before its group), `apply_event` doesn't need to reorder
/// anything itself — it just requires that replay happens oldest-seq-first,
/// which the WAL already guarantees.
///
/// Every map here is string-keyed (nested `driver -> group -> GroupRecord`
/// rather than a tuple-keyed map) so the whole struct round-trips through
/// `serde_json` without a custom (de)serializer.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub nodes: HashMap<String, NodeRecord>,
    #[serde(default)]
    pub groups: HashMap<String, HashMap<String, GroupRecord>>,
    #[serde(default)]
    pub subscriptions: Vec<SubscriptionRecord>,
}

impl MaterializedState {
    pub fn apply_event(&mut self, event: &GatewayEvent) {
        match event {
            GatewayEvent::AddNode { name, plugin, kind } => {
                self.nodes.entry(name.clone()).or_insert_with(|| NodeRecord {
                    name: name.clone(),
                    plugin: plugin.clone(),
                    kind: *kind,
                    setting: None,
                });
            }
            GatewayEvent::DelNode { name } => {
                self.nodes.remove(name);
                self.groups.remove(name);
                self.subscriptions.retain(|s| s.driver != *name && s.app != *name);
            }
            GatewayEvent::RenameNode { name, new_name } => {
                if let Some(mut node) = self.nodes.remove(name) {
                    node.name = new_name.clone();
                    self.nodes.insert(new_name.clone(), node);
                }
                if let Some(groups) = self.groups.remove(name) {
                    self.groups.insert(new_name.clone(), groups);
                }
                for sub in self.subscriptions.iter_mut() {
                    if sub.driver == *name {
                        sub.driver = new_name.clone();
                    }
                    if sub.app == *name {
                        sub.app = new_name.clone();
                    }
                }
            }
            GatewayEvent::SetSetting { name, setting } => {
                if let Some(node) = self.nodes.get_mut(name) {
                    node.setting = Some(setting.clone());
                }
            }
            GatewayEvent::AddGroup { driver, group, interval_ms } => {
                self.groups.entry(driver.clone()).or_default().entry(group.clone()).or_insert_with(|| {
                    GroupRecord { name: group.clone(), interval_ms: *interval_ms, tags: HashMap::new() }
                });
            }
            GatewayEvent::DelGroup { driver, group } => {
                if let Some(groups) = self.groups.get_mut(driver) {
                    groups.remove(group);
                }
                self.subscriptions.retain(|s| !(s.driver == *driver && s.group == *group));
            }
            GatewayEvent::UpdateGroup { driver, group, interval_ms } => {
                if let Some(record) = self.groups.get_mut(driver).and_then(|g| g.get_mut(group)) {
                    record.interval_ms = *interval_ms;
                }
            }
            GatewayEvent::AddTag { driver, group, tag } | GatewayEvent::UpdateTag { driver, group, tag } => {
                if let Some(record) = self.groups.get_mut(driver).and_then(|g| g.get_mut(group)) {
                    record.tags.insert(tag.name.clone(), tag.clone());
                }
            }
            GatewayEvent::DelTag { driver, group, tag } => {
                if let Some(record) = self.groups.get_mut(driver).and_then(|g| g.get_mut(group)) {
                    record.tags.remove(tag);
                }
            }
            GatewayEvent::AddSubscription { app, driver, group, params } => {
                if !self.subscriptions.iter().any(|s| s.app == *app && s.driver == *driver && s.group == *group) {
                    self.subscriptions.push(SubscriptionRecord {
                        app: app.clone(),
                        driver: driver.clone(),
                        group: group.clone(),
                        params: params.clone(),
                    });
                }
            }
            GatewayEvent::UpdateSubscription { app, driver, group, params } => {
                if let Some(sub) =
                    self.subscriptions.iter_mut().find(|s| s.app == *app && s.driver == *driver && s.group == *group)
                {
                    sub.params = params.clone();
                }
            }
            GatewayEvent::DelSubscription { app, driver, group } => {
                self.subscriptions.retain(|s| !(s.app == *app && s.driver == *driver && s.group == *group));
            }
        }
    }

    pub fn tags_for(&self, driver: &str, group: &str) -> Vec<&TagDelta> {
        self.groups.get(driver).and_then(|g| g.get(group)).map(|record| record.tags.values().collect()).unwrap_or_default()
    }

    pub fn subscriptions_for_app(&self, app: &str) -> Vec<&SubscriptionRecord> {
        self.subscriptions.iter().filter(|s| s.app == app).collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
