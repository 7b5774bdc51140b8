// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin-surface request envelope (spec §4.2, §6).
//!
//! Every admin operation — node lifecycle, group/tag CRUD, subscriptions,
//! queries — is one `Request` variant here, dispatched 1:1 by
//! `gw-daemon::listener::handle_request`. This is the same contract an
//! HTTP handler would decode into; `gw-cli` is simply the concrete client
//! that already speaks it.

use gw_core::{AdapterType, SubscribeParams, TagAttribute, TagType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "op")]
pub enum Request {
    Ping,

    AddNode { name: String, plugin: String, kind: AdapterType },
    DelNode { name: String },
    UpdateNode { name: String, new_name: String },
    NodeSetting { name: String, setting: serde_json::Value },
    NodeCtl { name: String, start: bool },

    AddGroup { driver: String, group: String, interval_ms: u32 },
    DelGroup { driver: String, group: String },
    UpdateGroup { driver: String, group: String, interval_ms: u32 },

    AddTag { driver: String, group: String, tag: TagSpec },
    DelTag { driver: String, group: String, tag: String },
    UpdateTag { driver: String, group: String, tag: TagSpec },
    /// Atomic create-group-if-absent + add-tags (spec §4.4, three-phase
    /// validation). Not expressible as a loop of `AddTag`.
    AddGtag { driver: String, group: String, interval_ms: u32, tags: Vec<TagSpec> },

    SubscribeGroup { app: String, driver: String, group: String, params: SubscribeParams },
    UnsubscribeGroup { app: String, driver: String, group: String },
    UpdateSubscribeGroup { app: String, driver: String, group: String, params: SubscribeParams },

    ReadGroup { driver: String, group: String },
    WriteTag { driver: String, group: String, tag: String, value: serde_json::Value },
    WriteTags { driver: String, group: String, values: Vec<(String, serde_json::Value)> },

    GetNode,
    GetGroup { driver: String },
    GetTag { driver: String, group: String },
    GetSubGroup { app: String },
}

/// Wire-serializable tag definition carried in `AddTag`/`AddGtag`/`UpdateTag`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagSpec {
    pub name: String,
    pub address: String,
    pub r#type: TagType,
    pub attribute: TagAttribute,
}
