// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription: one app's standing interest in one driver group (spec §3, §4.7).

use serde::{Deserialize, Serialize};

use crate::id::SubscriptionId;

/// Per-subscription parameters an app can tune without resubscribing
/// (spec §4.7: `UPDATE_SUBSCRIBE_GROUP`).
///
/// Params are opaque to the manager except that apps of kind MQTT require a
/// non-empty `topic` (spec §3, §4.8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribeParams {
    /// If `true`, TRANS_DATA is delivered even when no tag in the group changed.
    pub send_when_static: bool,
    /// Publish topic for MQTT apps. Required (non-empty) when the
    /// subscribing app is of kind MQTT; opaque otherwise.
    #[serde(default)]
    pub topic: Option<String>,
}

impl Default for SubscribeParams {
    fn default() -> Self {
        SubscribeParams { send_when_static: false, topic: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub driver_name: String,
    pub group_name: String,
    pub app_name: String,
    pub params: SubscribeParams,
}

impl Subscription {
    pub fn new(driver_name: impl Into<String>, group_name: impl Into<String>, app_name: impl Into<String>) -> Self {
        Subscription {
            id: SubscriptionId::new(),
            driver_name: driver_name.into(),
            group_name: group_name.into(),
            app_name: app_name.into(),
            params: SubscribeParams::default(),
        }
    }

    pub fn matches(&self, driver_name: &str, group_name: &str, app_name: &str) -> bool {
        self.driver_name == driver_name && self.group_name == group_name && self.app_name == app_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_checks_all_three_keys() {
        let sub = Subscription::new("modbus1", "fast", "mqtt1");
        assert!(sub.matches("modbus1", "fast", "mqtt1"));
        assert!(!sub.matches("modbus1", "fast", "mqtt2"));
        assert!(!sub.matches("modbus1", "slow", "mqtt1"));
        assert!(!sub.matches("modbus2", "fast", "mqtt1"));
    }

    #[test]
    fn default_params_do_not_send_when_static() {
        assert!(!SubscribeParams::default().send_when_static);
    }
}
