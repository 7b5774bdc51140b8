// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! App capability trait (spec §6, §4.5): north-bound plugins that receive
//! `TRANS_DATA` for their subscriptions and may answer ad-hoc requests.

use async_trait::async_trait;
use gw_core::GatewayError;
use serde_json::Value;

use crate::descriptor::PluginDescriptor;
use crate::driver::PluginError;

/// One tag's value as delivered to an app plugin.
#[derive(Debug, Clone)]
pub struct TagSample {
    pub tag: String,
    pub value: Option<Value>,
    pub timestamp: i64,
}

/// A downstream read/write decoded off the upstream transport, translated
/// into the bus operation that will actually satisfy it (spec §4.5).
#[derive(Debug, Clone)]
pub enum DownstreamOp {
    ReadGroup { driver: String, group: String },
    WriteTag { driver: String, group: String, tag: String, value: Value },
    WriteTags { driver: String, group: String, values: Vec<(String, Value)> },
}

/// A decoded downstream request, carrying the upstream correlation id and
/// the topic its response belongs on.
#[derive(Debug, Clone)]
pub struct DownstreamRequest {
    pub ctx: String,
    pub response_topic: String,
    pub op: DownstreamOp,
}

/// Outcome of executing a [`DownstreamOp`], ready for the plugin to encode.
#[derive(Debug, Clone)]
pub enum DownstreamResult {
    Values(Vec<TagSample>),
    Ack,
    Error(GatewayError),
}

/// Capability set for an APP-kind plugin.
///
/// `publish` is the data path: the engine calls it once per subscribed
/// group whenever that group's change test fires (or, for
/// `send_when_static` subscriptions, on every poll regardless of change),
/// handing it the topic resolved from the adapter's route table.
/// `request` is the admin-style escape hatch for plugin-specific queries
/// that don't fit the core wire protocol (spec §4.5's "request" operation).
/// `decode_downstream`/`encode_downstream_response` implement the
/// downstream read/write path: the upstream transport's request is decoded
/// into a `DownstreamRequest`, executed as a bus operation by the caller,
/// and the result re-encoded for publication on `response_topic`.
#[async_trait]
pub trait AppPlugin: Send + Sync + std::fmt::Debug {
    fn descriptor(&self) -> &PluginDescriptor;

    async fn open(&self) -> Result<(), PluginError> {
        Ok(())
    }
    async fn close(&self) {}
    fn setting(&self, _value: Value) -> Result<(), PluginError> {
        Ok(())
    }

    async fn publish(&self, driver: &str, group: &str, topic: &str, samples: &[TagSample]) -> Result<(), GatewayError>;

    /// Answers a plugin-defined request. Default: not supported.
    async fn request(&self, _payload: Value) -> Result<Value, GatewayError> {
        Err(GatewayError::PluginTypeNotSupport)
    }

    /// Decodes a downstream read/write arriving on `topic`. Default: not
    /// supported (most app kinds have no downstream path).
    fn decode_downstream(&self, _topic: &str, _payload: Value) -> Result<DownstreamRequest, GatewayError> {
        Err(GatewayError::PluginTypeNotSupport)
    }

    /// Re-encodes a downstream result as `(response_topic, payload)`.
    fn encode_downstream_response(&self, _request: &DownstreamRequest, _result: DownstreamResult) -> Result<(String, Value), GatewayError> {
        Err(GatewayError::PluginTypeNotSupport)
    }
}
