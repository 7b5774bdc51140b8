// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter identity and lifecycle state machine (spec §3, §4.4).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdapterType {
    Driver,
    App,
}

/// Node lifecycle state (spec §4.4 state machine).
///
/// ```text
/// IDLE --init--> INIT --setting?--> READY --start--> RUNNING
/// RUNNING --stop--> STOPPED --start--> RUNNING
/// any --uninit--> IDLE (terminal before destroy)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdapterState {
    Idle,
    Init,
    Ready,
    Running,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("node state {from:?} does not permit {command}")]
pub struct StateTransitionError {
    pub from: AdapterState,
    pub command: &'static str,
}

impl AdapterState {
    /// Admin commands that don't match the current state fail outright;
    /// they never implicitly advance state (spec §4.4).
    pub fn apply(self, command: AdapterCommand) -> Result<AdapterState, StateTransitionError> {
        use AdapterCommand as Cmd;
        use AdapterState::*;
        let err = |command: &'static str| StateTransitionError { from: self, command };
        match (self, command) {
            (Idle, Cmd::Init) => Ok(Init),
            (Init, Cmd::Setting) => Ok(Ready),
            (Init, Cmd::Start) => Ok(Running),
            (Ready, Cmd::Start) => Ok(Running),
            (Running, Cmd::Stop) => Ok(Stopped),
            (Stopped, Cmd::Start) => Ok(Running),
            (_, Cmd::Uninit) => Ok(Idle),
            (_, Cmd::Init) => Err(err("init")),
            (_, Cmd::Setting) => Err(err("setting")),
            (_, Cmd::Start) => Err(err("start")),
            (_, Cmd::Stop) => Err(err("stop")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterCommand {
    Init,
    Setting,
    Start,
    Stop,
    Uninit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}
