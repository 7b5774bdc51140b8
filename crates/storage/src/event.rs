// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logical WAL deltas (spec §6): the persisted facts the manager emits on
//! every mutating admin operation. Replaying them in order against a fresh
//! [`crate::MaterializedState`] reproduces the manager's durable state.

use gw_core::{AdapterType, SubscribeParams, TagType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum GatewayEvent {
    AddNode { name: String, plugin: String, kind: AdapterType },
    DelNode { name: String },
    RenameNode { name: String, new_name: String },
    SetSetting { name: String, setting: serde_json::Value },

    AddGroup { driver: String, group: String, interval_ms: u32 },
    DelGroup { driver: String, group: String },
    UpdateGroup { driver: String, group: String, interval_ms: u32 },

    AddTag { driver: String, group: String, tag: TagDelta },
    DelTag { driver: String, group: String, tag: String },
    UpdateTag { driver: String, group: String, tag: TagDelta },

    AddSubscription { app: String, driver: String, group: String, params: SubscribeParams },
    DelSubscription { app: String, driver: String, group: String },
    UpdateSubscription { app: String, driver: String, group: String, params: SubscribeParams },
}

/// Persisted tag shape; intentionally narrower than [`gw_core::Tag`] — only
/// what's needed to reconstruct a tag on replay.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagDelta {
    pub name: String,
    pub address: String,
    pub r#type: TagType,
    pub attribute: gw_core::TagAttribute,
}
