// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gw_core::{AdapterState, AdapterType, ErrorCode, Subscription, Tag};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Mirrors every mutating request: `error` is 0 on success, otherwise a
    /// [`gw_core::GatewayError`] wire code (spec §7).
    Error { error: ErrorCode, message: Option<String> },

    Pong,

    Nodes { nodes: Vec<NodeSummary> },
    Groups { groups: Vec<GroupSummary> },
    Tags { tags: Vec<Tag> },
    Subscriptions { subscriptions: Vec<Subscription> },

    /// Synchronous group read (spec §4.2 `READ_GROUP`): current cached
    /// values, one entry per tag, errors carried per-tag rather than
    /// failing the whole response.
    GroupValues { values: Vec<TagValue> },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeSummary {
    pub name: String,
    pub plugin: String,
    pub kind: AdapterType,
    pub state: AdapterState,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupSummary {
    pub name: String,
    pub interval_ms: u32,
    pub tag_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagValue {
    pub tag: String,
    pub value: Option<serde_json::Value>,
    pub error: ErrorCode,
}

impl Response {
    pub fn ok() -> Self {
        Response::Error { error: 0, message: None }
    }

    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Response::Error { error: code, message: Some(message.into()) }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Error { error: 0, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_is_success() {
        assert!(Response::ok().is_success());
        assert!(!Response::error(1, "boom").is_success());
    }
}
