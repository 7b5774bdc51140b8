// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin descriptor (spec §6): the metadata every plugin exports, whether
//! driver or app. `intf_funs` (the reference implementation's
//! function-pointer table) is replaced by the `DriverPlugin`/`AppPlugin`
//! trait object itself — the descriptor only carries data.

use gw_core::AdapterType;
use serde::{Deserialize, Serialize};

/// How a driver's per-group timer is armed (DESIGN NOTES §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerType {
    /// Serial: the next tick isn't armed until the current `group_timer`
    /// call returns. No catch-up, no overlap.
    Block,
    /// A fresh task is spawned on every tick regardless of whether the
    /// previous one finished.
    NonBlock,
}

/// An app plugin's replay policy on reconnect (spec §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheType {
    /// Republish every cached value on reconnect.
    Always,
    /// Only republish values that changed since the last successful publish.
    OnChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PluginDescriptor {
    pub version: String,
    pub schema: serde_json::Value,
    pub module_name: String,
    pub description: String,
    pub kind: AdapterType,
    pub display: String,
    pub single: bool,
    pub single_name: Option<String>,
    pub timer_type: TimerType,
    pub cache_type: CacheType,
}

impl PluginDescriptor {
    pub fn driver(module_name: impl Into<String>, display: impl Into<String>) -> Self {
        PluginDescriptor {
            version: "1.0.0".to_string(),
            schema: serde_json::json!({}),
            module_name: module_name.into(),
            description: String::new(),
            kind: AdapterType::Driver,
            display: display.into(),
            single: false,
            single_name: None,
            timer_type: TimerType::Block,
            cache_type: CacheType::Always,
        }
    }

    pub fn app(module_name: impl Into<String>, display: impl Into<String>) -> Self {
        PluginDescriptor {
            version: "1.0.0".to_string(),
            schema: serde_json::json!({}),
            module_name: module_name.into(),
            description: String::new(),
            kind: AdapterType::App,
            display: display.into(),
            single: false,
            single_name: None,
            timer_type: TimerType::NonBlock,
            cache_type: CacheType::OnChange,
        }
    }
}
