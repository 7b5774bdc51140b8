// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process bus envelope: the same request/response/event taxonomy as the
//! admin surface, addressed by sender/receiver name and carried over typed
//! `tokio::sync::mpsc` channels rather than serialized (spec §4.2, DESIGN
//! NOTES §9 "Message bus via pointer passing").

use gw_core::{Header, MsgType};
use serde::{Deserialize, Serialize};

use crate::request::Request;
use crate::response::{NodeSummary, Response, TagValue};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    pub header: Header,
    pub body: BusBody,
}

impl Envelope {
    pub fn request(sender: impl Into<String>, receiver: impl Into<String>, request: Request) -> Self {
        Envelope {
            header: Header::new(msg_type_of(&request), sender, receiver),
            body: BusBody::Request(request),
        }
    }

    pub fn response(header: Header, response: Response) -> Self {
        Envelope { header, body: BusBody::Response(response) }
    }

    pub fn event(sender: impl Into<String>, receiver: impl Into<String>, event: BusEvent) -> Self {
        let msg_type = match event {
            BusEvent::TransData { .. } => MsgType::TransData,
            BusEvent::NodesState { .. } => MsgType::NodesState,
            BusEvent::NodeDeleted { .. } => MsgType::NodeDeleted,
        };
        Envelope { header: Header::new(msg_type, sender, receiver), body: BusBody::Event(event) }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum BusBody {
    Request(Request),
    Response(Response),
    Event(BusEvent),
}

/// The three event types that flow driver→app or manager→app (spec §4.2).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum BusEvent {
    /// Periodic telemetry: a driver's group snapshot, diffed against the
    /// last published values, delivered to every app subscribed to
    /// (driver, group). `timestamp` is the tick's `global_timestamp` value.
    TransData { driver: String, group: String, values: Vec<TagValue>, timestamp: i64 },
    NodesState { nodes: Vec<NodeSummary> },
    /// Sent to every app subscribed to a driver when that driver is
    /// deleted (spec §4.6 `del_node` cascade).
    NodeDeleted { node: String },
}

fn msg_type_of(request: &Request) -> MsgType {
    use Request::*;
    match request {
        Ping => MsgType::RespError, // never actually sent; admin-only probe
        AddNode { .. } => MsgType::AddNode,
        DelNode { .. } => MsgType::DelNode,
        UpdateNode { .. } => MsgType::UpdateNode,
        NodeSetting { .. } => MsgType::NodeSetting,
        NodeCtl { .. } => MsgType::NodeCtl,
        AddGroup { .. } => MsgType::AddGroup,
        DelGroup { .. } => MsgType::DelGroup,
        UpdateGroup { .. } => MsgType::UpdateGroup,
        AddTag { .. } => MsgType::AddTag,
        DelTag { .. } => MsgType::DelTag,
        UpdateTag { .. } => MsgType::UpdateTag,
        AddGtag { .. } => MsgType::AddGtag,
        SubscribeGroup { .. } => MsgType::SubscribeGroup,
        UnsubscribeGroup { .. } => MsgType::UnsubscribeGroup,
        UpdateSubscribeGroup { .. } => MsgType::UpdateSubscribeGroup,
        ReadGroup { .. } => MsgType::ReadGroup,
        WriteTag { .. } => MsgType::WriteTag,
        WriteTags { .. } => MsgType::WriteTags,
        GetNode => MsgType::GetNode,
        GetGroup { .. } => MsgType::GetGroup,
        GetTag { .. } => MsgType::GetTag,
        GetSubGroup { .. } => MsgType::GetSubGroup,
    }
}
