// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver adapter (spec §4.4): owns one plugin instance's groups, runs the
//! per-group BLOCK/NONBLOCK timer through the reactor, and fans
//! `TRANS_DATA` out to every app subscribed to (driver, group).

use std::collections::HashMap;
use std::sync::Arc;

use gw_core::{GatewayError, Group, Tag, TagAttribute};
use gw_plugins::{DriverPlugin, TimerType};
use gw_wire::{BusEvent, Envelope, TagValue};
use parking_lot::RwLock;
use tokio::sync::mpsc;

use crate::bus::Bus;
use crate::subscription_manager::SubscriptionManager;

/// Ceiling on groups per driver node (spec §4.8's `add_drivers` pre-check).
pub const GROUP_MAX_PER_NODE: usize = 64;

/// Cached poll plan for one group, rebuilt only when `Group::change_test`
/// reports a structural change (spec §4.3). `Option<Box<dyn PollPlan>>` in
/// the reference design collapses here to a plain struct since the plan's
/// shape is known statically in this implementation.
struct PollPlan {
    last_ts: i64,
    static_tags: Vec<Tag>,
    other_tags: Vec<Tag>,
}

/// A driver node: one plugin instance plus its groups (spec §4.4).
pub struct DriverAdapter {
    name: String,
    plugin: Arc<dyn DriverPlugin>,
    groups: RwLock<HashMap<String, Arc<Group>>>,
    plans: RwLock<HashMap<String, PollPlan>>,
    bus: Arc<Bus>,
    subscriptions: Arc<SubscriptionManager>,
}

impl DriverAdapter {
    pub fn new(
        name: impl Into<String>,
        plugin: Arc<dyn DriverPlugin>,
        bus: Arc<Bus>,
        subscriptions: Arc<SubscriptionManager>,
    ) -> Self {
        DriverAdapter {
            name: name.into(),
            plugin,
            groups: RwLock::new(HashMap::new()),
            plans: RwLock::new(HashMap::new()),
            bus,
            subscriptions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timer_type(&self) -> TimerType {
        self.plugin.descriptor().timer_type
    }

    /// Forwards a `NODE_SETTING` admin request to the plugin (spec §4.4).
    pub fn apply_setting(&self, value: serde_json::Value) -> Result<(), GatewayError> {
        self.plugin.setting(value).map_err(|err| match err {
            gw_plugins::PluginError::Gateway(inner) => inner,
            _ => GatewayError::EInternal,
        })
    }

    pub fn add_group(&self, group: &str, interval_ms: u32) -> Result<(), GatewayError> {
        let mut groups = self.groups.write();
        if groups.contains_key(group) {
            return Err(GatewayError::GroupExist);
        }
        if groups.len() >= GROUP_MAX_PER_NODE {
            return Err(GatewayError::GroupMaxGroups);
        }
        groups.insert(group.to_string(), Arc::new(Group::new(group, interval_ms)));
        Ok(())
    }

    pub fn del_group(&self, group: &str) -> Result<(), GatewayError> {
        self.groups.write().remove(group).ok_or(GatewayError::GroupNotExist)?;
        self.plans.write().remove(group);
        Ok(())
    }

    pub fn group(&self, group: &str) -> Option<Arc<Group>> {
        self.groups.read().get(group).cloned()
    }

    pub fn group_names(&self) -> Vec<String> {
        self.groups.read().keys().cloned().collect()
    }

    /// Three-phase `ADD_GTAG` validation (spec §4.4): per-tag syntactic
    /// check, then a cross-tag pass, then commit. No partial commits — if
    /// either validation phase fails, the group is left untouched.
    pub fn add_gtag(&self, group: &str, tags: Vec<Tag>) -> Result<(), GatewayError> {
        for tag in &tags {
            self.plugin.validate_tag(tag)?;
        }
        self.plugin.tag_validator(&tags)?;

        let group_handle = self.group(group).ok_or(GatewayError::GroupNotExist)?;
        for tag in &tags {
            group_handle.add_tag(tag.clone()).map_err(|_| GatewayError::TagNameConflict)?;
        }
        self.plugin.load_tags(group, &tags);
        tracing::info!(driver = %self.name, group, tags = tags.len(), "gtag added");
        Ok(())
    }

    async fn ensure_plan(&self, group: &str, group_handle: &Group) {
        let needs_rebuild = {
            let plans = self.plans.read();
            match plans.get(group) {
                Some(plan) => group_handle.change_timestamp() != plan.last_ts,
                None => true,
            }
        };
        if !needs_rebuild {
            return;
        }
        let (static_tags, other_tags) = group_handle.split_tags();
        self.plans.write().insert(
            group.to_string(),
            PollPlan { last_ts: group_handle.change_timestamp(), static_tags, other_tags },
        );
    }

    /// One scheduler tick for `group`: rebuilds the poll plan if the
    /// group's tag set changed, polls the device for pollable tags, and
    /// fans the resulting `TRANS_DATA` out to every subscribed app.
    pub async fn poll_group(&self, group: &str) -> Result<(), GatewayError> {
        let group_handle = self.group(group).ok_or(GatewayError::GroupNotExist)?;
        self.ensure_plan(group, &group_handle).await;

        let subscriptions = self
            .subscriptions
            .find_by_driver(&self.name)
            .into_iter()
            .filter(|sub| sub.group_name == group)
            .collect::<Vec<_>>();

        let (static_tags, other_tags) = {
            let plans = self.plans.read();
            // ensure_plan just inserted this key under the same lock discipline.
            #[allow(clippy::expect_used)]
            let plan = plans.get(group).expect("plan was just ensured");
            (plan.static_tags.clone(), plan.other_tags.clone())
        };

        let wants_static_only = subscriptions.iter().any(|sub| sub.params.send_when_static);
        if other_tags.is_empty() && !wants_static_only {
            return Ok(());
        }

        let mut values: Vec<TagValue> = static_tags
            .iter()
            .map(|tag| TagValue { tag: tag.name.clone(), value: tag.static_value.clone(), error: 0 })
            .collect();

        if !other_tags.is_empty() {
            let (tx, mut rx) = mpsc::channel(other_tags.len().max(1));
            self.plugin.group_timer(&self.name, group, &other_tags, tx).await.map_err(|e| {
                tracing::warn!(driver = %self.name, group, error = %e, "group_timer failed");
                match e {
                    gw_plugins::PluginError::Gateway(inner) => inner,
                    _ => GatewayError::EInternal,
                }
            })?;
            while let Some(update) = rx.recv().await {
                values.push(TagValue { tag: update.tag, value: update.value, error: update.error });
            }
        }

        let timestamp = gw_core::now_us();
        for sub in subscriptions {
            let envelope = Envelope::event(
                &self.name,
                &sub.app_name,
                BusEvent::TransData { driver: self.name.clone(), group: group.to_string(), values: values.clone(), timestamp },
            );
            let _ = self.bus.send(envelope).await;
        }
        Ok(())
    }

    pub async fn write_tag(&self, group: &str, tag_name: &str, value: serde_json::Value) -> Result<(), GatewayError> {
        let group_handle = self.group(group).ok_or(GatewayError::GroupNotExist)?;
        let tag = group_handle.find_tag(tag_name).ok_or(GatewayError::TagNotExist)?;
        if !tag.attribute.contains(TagAttribute::WRITE) {
            return Err(GatewayError::TagAttributeNotSupport);
        }
        self.plugin.write_tag(group, &tag.address, value).await
    }

    pub async fn write_tags(&self, group: &str, values: &[(String, serde_json::Value)]) -> Result<(), GatewayError> {
        let group_handle = self.group(group).ok_or(GatewayError::GroupNotExist)?;
        let mut resolved = Vec::with_capacity(values.len());
        for (tag_name, value) in values {
            let tag = group_handle.find_tag(tag_name).ok_or(GatewayError::TagNotExist)?;
            if !tag.attribute.contains(TagAttribute::WRITE) {
                return Err(GatewayError::TagAttributeNotSupport);
            }
            resolved.push((tag.address.clone(), value.clone()));
        }
        self.plugin.write_tags(group, &resolved).await
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
