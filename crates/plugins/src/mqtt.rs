// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference APP plugin: publishes subscribed group values to an MQTT
//! broker. The broker itself is an in-memory stand-in — `published` is
//! the "wire" a test or an admin `request()` call can inspect. The
//! (driver, group) → topic route table lives on the engine's `AppAdapter`
//! (spec §4.5); this plugin only knows how to encode and send once handed
//! a resolved topic.

use std::collections::HashMap;

use async_trait::async_trait;
use gw_core::GatewayError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::{AppPlugin, DownstreamOp, DownstreamRequest, DownstreamResult, TagSample};
use crate::descriptor::{CacheType, PluginDescriptor};
use crate::driver::PluginError;

/// Broker-level configuration set via `setting()`. Opaque beyond these
/// fields: `client_id` is forwarded to the (stubbed) broker connection,
/// `qos` is the default QoS used when a subscription doesn't override it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct MqttSetting {
    #[serde(default)]
    client_id: Option<String>,
    #[serde(default)]
    qos: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: Value,
}

#[derive(Debug)]
pub struct MqttApp {
    descriptor: PluginDescriptor,
    setting: Mutex<MqttSetting>,
    last_value: Mutex<HashMap<String, Value>>,
    published: Mutex<Vec<PublishedMessage>>,
}

impl MqttApp {
    pub fn new() -> Self {
        MqttApp {
            descriptor: PluginDescriptor::app("mqtt", "MQTT"),
            setting: Mutex::new(MqttSetting::default()),
            last_value: Mutex::new(HashMap::new()),
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().clone()
    }
}

impl Default for MqttApp {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_topic(topic: &str) -> Result<(), GatewayError> {
    if topic.is_empty() || topic.contains('\0') {
        return Err(GatewayError::MqttIsNull);
    }
    Ok(())
}

#[async_trait]
impl AppPlugin for MqttApp {
    fn descriptor(&self) -> &PluginDescriptor {
        &self.descriptor
    }

    fn setting(&self, value: Value) -> Result<(), PluginError> {
        let setting: MqttSetting = serde_json::from_value(value).map_err(|_| GatewayError::GroupParameterInvalid)?;
        *self.setting.lock() = setting;
        Ok(())
    }

    async fn publish(&self, driver: &str, group: &str, topic: &str, samples: &[TagSample]) -> Result<(), GatewayError> {
        validate_topic(topic)?;

        let on_change = self.descriptor.cache_type == CacheType::OnChange;
        let mut last_value = self.last_value.lock();
        let mut changed = Vec::with_capacity(samples.len());
        for sample in samples {
            let key = format!("{driver}/{group}/{}", sample.tag);
            let unchanged = on_change
                && last_value.get(&key).is_some_and(|prev| Some(prev) == sample.value.as_ref());
            if !unchanged {
                if let Some(value) = &sample.value {
                    last_value.insert(key, value.clone());
                }
                changed.push(sample);
            }
        }
        if changed.is_empty() {
            return Ok(());
        }

        let payload = serde_json::json!(changed
            .iter()
            .map(|s| (s.tag.clone(), s.value.clone()))
            .collect::<HashMap<_, _>>());
        self.published.lock().push(PublishedMessage { topic: topic.to_string(), payload });
        Ok(())
    }

    async fn request(&self, payload: Value) -> Result<Value, GatewayError> {
        if payload.get("op").and_then(Value::as_str) == Some("setting") {
            let setting = self.setting.lock().clone();
            return Ok(serde_json::json!({ "client_id": setting.client_id, "qos": setting.qos }));
        }
        Err(GatewayError::PluginTypeNotSupport)
    }

    /// Decodes `{"ctx", "op": "read_group"|"write_tag"|"write_tags", "driver",
    /// "group", ...}` arriving on `topic` into the bus operation it requests.
    fn decode_downstream(&self, topic: &str, payload: Value) -> Result<DownstreamRequest, GatewayError> {
        let ctx = payload.get("ctx").and_then(Value::as_str).ok_or(GatewayError::GroupParameterInvalid)?.to_string();
        let driver = payload.get("driver").and_then(Value::as_str).ok_or(GatewayError::GroupParameterInvalid)?.to_string();
        let group = payload.get("group").and_then(Value::as_str).ok_or(GatewayError::GroupParameterInvalid)?.to_string();
        let op = match payload.get("op").and_then(Value::as_str) {
            Some("read_group") => DownstreamOp::ReadGroup { driver, group },
            Some("write_tag") => {
                let tag = payload.get("tag").and_then(Value::as_str).ok_or(GatewayError::GroupParameterInvalid)?.to_string();
                let value = payload.get("value").cloned().ok_or(GatewayError::GroupParameterInvalid)?;
                DownstreamOp::WriteTag { driver, group, tag, value }
            }
            Some("write_tags") => {
                let values = payload
                    .get("values")
                    .and_then(Value::as_object)
                    .ok_or(GatewayError::GroupParameterInvalid)?
                    .iter()
                    .map(|(tag, value)| (tag.clone(), value.clone()))
                    .collect();
                DownstreamOp::WriteTags { driver, group, values }
            }
            _ => return Err(GatewayError::GroupParameterInvalid),
        };
        Ok(DownstreamRequest { ctx, response_topic: format!("{topic}/response"), op })
    }

    fn encode_downstream_response(&self, request: &DownstreamRequest, result: DownstreamResult) -> Result<(String, Value), GatewayError> {
        let payload = match result {
            DownstreamResult::Values(samples) => serde_json::json!({
                "ctx": request.ctx,
                "values": samples.into_iter().map(|s| (s.tag, s.value)).collect::<HashMap<_, _>>(),
            }),
            DownstreamResult::Ack => serde_json::json!({ "ctx": request.ctx, "ok": true }),
            DownstreamResult::Error(err) => serde_json::json!({ "ctx": request.ctx, "error": err.code() }),
        };
        Ok((request.response_topic.clone(), payload))
    }
}
