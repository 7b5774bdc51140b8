// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Driver capability trait (spec §6, §9 "Plugin ABI as dynamic dispatch").
//!
//! Replaces the reference implementation's `intf_funs` function-pointer
//! table with a plain async trait: every driver plugin lives in-process,
//! so there's nothing to `dlopen` and no ABI to stabilize.

use async_trait::async_trait;
use gw_core::{ErrorCode, GatewayError, Tag};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::descriptor::PluginDescriptor;

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("plugin link is down")]
    LinkDown,
    #[error("plugin does not support this operation")]
    Unsupported,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// One tag's outcome from a device round trip, reported back through the
/// `group_timer` update channel rather than returned directly — the trip
/// may report partial results as they arrive.
#[derive(Debug, Clone)]
pub struct TagUpdate {
    pub tag: String,
    pub value: Option<serde_json::Value>,
    pub error: ErrorCode,
}

impl TagUpdate {
    pub fn ok(tag: impl Into<String>, value: serde_json::Value) -> Self {
        TagUpdate { tag: tag.into(), value: Some(value), error: 0 }
    }

    pub fn err(tag: impl Into<String>, error: GatewayError) -> Self {
        TagUpdate { tag: tag.into(), value: None, error: error.code() }
    }
}

/// Capability set for a DRIVER-kind plugin (spec §4.4, §6).
///
/// `open`/`close`/`init`/`uninit`/`start`/`stop` mirror the node lifecycle
/// in [`gw_core::AdapterState`]; the adapter calls them as the node's state
/// machine transitions. Everything else is the data path.
#[async_trait]
pub trait DriverPlugin: Send + Sync + std::fmt::Debug {
    fn descriptor(&self) -> &PluginDescriptor;

    async fn open(&self) -> Result<(), PluginError> {
        Ok(())
    }
    async fn close(&self) {}
    async fn init(&self) -> Result<(), PluginError> {
        Ok(())
    }
    async fn uninit(&self) {}
    async fn start(&self) -> Result<(), PluginError> {
        Ok(())
    }
    async fn stop(&self) {}
    fn setting(&self, _value: serde_json::Value) -> Result<(), PluginError> {
        Ok(())
    }

    /// Syntactic/plugin-level validation of one tag (ADD_GTAG phase 1).
    fn validate_tag(&self, _tag: &Tag) -> Result<(), GatewayError> {
        Ok(())
    }

    /// Cross-tag validation over the full candidate set (ADD_GTAG phase 2).
    /// Default accepts any set that individually passed `validate_tag`.
    fn tag_validator(&self, _tags: &[Tag]) -> Result<(), GatewayError> {
        Ok(())
    }

    /// Performs the device round trip for one group's tags, reporting each
    /// tag's outcome on `updates` as it becomes available. The adapter owns
    /// re-arming the next tick per the descriptor's `TimerType`.
    async fn group_timer(
        &self,
        driver: &str,
        group: &str,
        tags: &[Tag],
        updates: mpsc::Sender<TagUpdate>,
    ) -> Result<(), PluginError>;

    /// Out-of-band resync, distinct from the periodic timer (e.g. a
    /// subscription-driven unsolicited read). Default: same as one timer tick.
    async fn group_sync(
        &self,
        driver: &str,
        group: &str,
        tags: &[Tag],
        updates: mpsc::Sender<TagUpdate>,
    ) -> Result<(), PluginError> {
        self.group_timer(driver, group, tags, updates).await
    }

    async fn write_tag(&self, _group: &str, _tag: &str, _value: serde_json::Value) -> Result<(), GatewayError> {
        Err(GatewayError::PluginTypeNotSupport)
    }

    async fn write_tags(&self, _group: &str, _values: &[(String, serde_json::Value)]) -> Result<(), GatewayError> {
        Err(GatewayError::PluginTypeNotSupport)
    }

    /// Notifies the plugin of the committed tag set after an add/del/load,
    /// so a plugin that precomputes address layouts (e.g. Modbus register
    /// coalescing) can rebuild it. Defaults are no-ops for plugins that
    /// recompute lazily inside `group_timer` instead.
    fn load_tags(&self, _group: &str, _tags: &[Tag]) {}
    fn add_tags(&self, _group: &str, _tags: &[Tag]) {}
    fn del_tags(&self, _group: &str, _tag_names: &[String]) {}
}
