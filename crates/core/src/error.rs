// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across the bus (spec §7).
//!
//! Every request path returns one of these. The numeric `code()` is what
//! crosses the wire; the `Display` impl is the diagnostic string an admin
//! client shows a human.

use thiserror::Error;

/// Stable wire code for a [`GatewayError`]. Never reused or reassigned.
pub type ErrorCode = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("success")]
    Success,

    // --- NODE_* ---
    #[error("node does not exist")]
    NodeNotExist,
    #[error("node already exists")]
    NodeExist,
    #[error("node is not in a state that allows this operation")]
    NodeStateInvalid,
    #[error("operation not allowed on this node")]
    NodeNotAllow,

    // --- GROUP_* ---
    #[error("group does not exist")]
    GroupNotExist,
    #[error("group already exists")]
    GroupExist,
    #[error("maximum number of groups per node exceeded")]
    GroupMaxGroups,
    #[error("group parameter is invalid")]
    GroupParameterInvalid,
    #[error("no app is subscribed to this group")]
    GroupNotSubscribe,

    // --- TAG_* ---
    #[error("tag does not exist")]
    TagNotExist,
    #[error("tag name conflict")]
    TagNameConflict,
    #[error("tag type mismatch")]
    TagTypeMismatch,
    #[error("tag attribute does not support this operation")]
    TagAttributeNotSupport,

    // --- LIBRARY_* (plugin) ---
    #[error("plugin library not found")]
    LibraryNotFound,
    #[error("plugin library failed to open")]
    LibraryOpenFailed,
    #[error("plugin library not allowed")]
    LibraryNotAllow,

    // --- MQTT_* ---
    #[error("mqtt publish failure")]
    MqttPublishFailure,
    #[error("mqtt subscribe failure")]
    MqttSubscribeFailure,
    #[error("mqtt payload is null")]
    MqttIsNull,
    #[error("mqtt transport disconnected")]
    MqttDisconnected,

    // --- PLUGIN_* ---
    #[error("plugin type not supported for this operation")]
    PluginTypeNotSupport,

    #[error("internal error")]
    EInternal,
}

impl GatewayError {
    pub const fn code(self) -> ErrorCode {
        match self {
            GatewayError::Success => 0,
            GatewayError::NodeNotExist => 1001,
            GatewayError::NodeExist => 1002,
            GatewayError::NodeStateInvalid => 1003,
            GatewayError::NodeNotAllow => 1004,
            GatewayError::GroupNotExist => 2001,
            GatewayError::GroupExist => 2002,
            GatewayError::GroupMaxGroups => 2003,
            GatewayError::GroupParameterInvalid => 2004,
            GatewayError::GroupNotSubscribe => 2005,
            GatewayError::TagNotExist => 3001,
            GatewayError::TagNameConflict => 3002,
            GatewayError::TagTypeMismatch => 3003,
            GatewayError::TagAttributeNotSupport => 3004,
            GatewayError::LibraryNotFound => 4001,
            GatewayError::LibraryOpenFailed => 4002,
            GatewayError::LibraryNotAllow => 4003,
            GatewayError::MqttPublishFailure => 5001,
            GatewayError::MqttSubscribeFailure => 5002,
            GatewayError::MqttIsNull => 5003,
            GatewayError::MqttDisconnected => 5004,
            GatewayError::PluginTypeNotSupport => 6001,
            GatewayError::EInternal => 9999,
        }
    }

    pub fn from_code(code: ErrorCode) -> Self {
        match code {
            0 => GatewayError::Success,
            1001 => GatewayError::NodeNotExist,
            1002 => GatewayError::NodeExist,
            1003 => GatewayError::NodeStateInvalid,
            1004 => GatewayError::NodeNotAllow,
            2001 => GatewayError::GroupNotExist,
            2002 => GatewayError::GroupExist,
            2003 => GatewayError::GroupMaxGroups,
            2004 => GatewayError::GroupParameterInvalid,
            2005 => GatewayError::GroupNotSubscribe,
            3001 => GatewayError::TagNotExist,
            3002 => GatewayError::TagNameConflict,
            3003 => GatewayError::TagTypeMismatch,
            3004 => GatewayError::TagAttributeNotSupport,
            4001 => GatewayError::LibraryNotFound,
            4002 => GatewayError::LibraryOpenFailed,
            4003 => GatewayError::LibraryNotAllow,
            5001 => GatewayError::MqttPublishFailure,
            5002 => GatewayError::MqttSubscribeFailure,
            5003 => GatewayError::MqttIsNull,
            5004 => GatewayError::MqttDisconnected,
            6001 => GatewayError::PluginTypeNotSupport,
            _ => GatewayError::EInternal,
        }
    }

    pub const fn is_success(self) -> bool {
        matches!(self, GatewayError::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trips() {
        let all = [
            GatewayError::Success,
            GatewayError::NodeNotExist,
            GatewayError::GroupMaxGroups,
            GatewayError::TagTypeMismatch,
            GatewayError::LibraryNotFound,
            GatewayError::MqttDisconnected,
            GatewayError::PluginTypeNotSupport,
            GatewayError::EInternal,
        ];
        for e in all {
            assert_eq!(GatewayError::from_code(e.code()), e);
        }
    }

    #[test]
    fn unknown_code_maps_to_internal() {
        assert_eq!(GatewayError::from_code(-1), GatewayError::EInternal);
    }
}
