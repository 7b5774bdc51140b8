// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bus message envelope: header plus the tagged message-type taxonomy
//! (spec §4.2).

use serde::{Deserialize, Serialize};

/// Correlation context threaded opaquely through request/response pairs.
/// Carried verbatim so a downstream protocol's correlation id (e.g. an
/// upstream MQTT request id) survives a round trip through the bus.
pub type Ctx = Vec<u8>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub msg_type: MsgType,
    #[serde(default)]
    pub ctx: Ctx,
    pub sender: String,
    pub receiver: String,
}

impl Header {
    pub fn new(msg_type: MsgType, sender: impl Into<String>, receiver: impl Into<String>) -> Self {
        Header { msg_type, ctx: Vec::new(), sender: sender.into(), receiver: receiver.into() }
    }

    pub fn with_ctx(mut self, ctx: Ctx) -> Self {
        self.ctx = ctx;
        self
    }
}

/// The bus message-type taxonomy (spec §4.2), kept verbatim: requests,
/// their mirrored responses, and the three event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MsgType {
    // Data-plane requests
    ReadGroup,
    WriteTag,
    WriteTags,
    WriteGtags,
    SubscribeGroup,
    UnsubscribeGroup,
    UpdateSubscribeGroup,

    // Admin requests
    AddNode,
    DelNode,
    UpdateNode,
    NodeSetting,
    NodeCtl,
    AddGroup,
    DelGroup,
    UpdateGroup,
    AddTag,
    DelTag,
    UpdateTag,
    AddGtag,
    GetNode,
    GetGroup,
    GetTag,
    GetSubGroup,

    // Responses (mirror the request they answer)
    RespError,
    RespReadGroup,
    RespGetNode,
    RespGetGroup,
    RespGetTag,
    RespGetSubGroup,

    // Events
    TransData,
    NodesState,
    NodeDeleted,
}

impl MsgType {
    /// True for driver/app administrative commands that mutate the node
    /// manager or subscription table, as opposed to data-plane traffic.
    pub fn is_admin(self) -> bool {
        use MsgType::*;
        matches!(
            self,
            AddNode
                | DelNode
                | UpdateNode
                | NodeSetting
                | NodeCtl
                | AddGroup
                | DelGroup
                | UpdateGroup
                | AddTag
                | DelTag
                | UpdateTag
                | AddGtag
                | GetNode
                | GetGroup
                | GetTag
                | GetSubGroup
        )
    }

    pub fn is_event(self) -> bool {
        matches!(self, MsgType::TransData | MsgType::NodesState | MsgType::NodeDeleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips_through_json() {
        let header = Header::new(MsgType::WriteTag, "mqtt1", "modbus1").with_ctx(vec![0xDE, 0xAD]);
        let json = serde_json::to_string(&header).unwrap();
        let back: Header = serde_json::from_str(&json).unwrap();
        assert_eq!(header, back);
    }

    #[test]
    fn admin_and_event_classification_are_disjoint() {
        for variant in [MsgType::AddNode, MsgType::GetSubGroup] {
            assert!(variant.is_admin());
            assert!(!variant.is_event());
        }
        for variant in [MsgType::TransData, MsgType::NodeDeleted] {
            assert!(variant.is_event());
            assert!(!variant.is_admin());
        }
        assert!(!MsgType::WriteTag.is_admin());
        assert!(!MsgType::WriteTag.is_event());
    }
}
