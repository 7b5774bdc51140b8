// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gatewayctl`: admin CLI over the `gatewayd` Unix socket (spec §6).
//!
//! Every subcommand maps 1:1 onto a `gw_wire::Request` variant; the
//! response is printed as JSON and the process exits non-zero on an
//! `Error` response.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gw_core::{AdapterType, SubscribeParams, TagAttribute, TagType};
use gw_wire::{Request, TagSpec};

use client::GatewayClient;

const DEFAULT_SOCKET: &str = "/run/gatewayd/gateway.sock";

#[derive(Parser, Debug)]
#[command(name = "gatewayctl", about = "Admin client for the gatewayd edge gateway daemon")]
struct Cli {
    /// Path to the daemon's admin Unix socket.
    #[arg(long, global = true, default_value = DEFAULT_SOCKET)]
    socket: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Round-trip health check.
    Ping,

    /// Register a new node (driver or app).
    AddNode { name: String, plugin: String, #[arg(long, value_enum)] kind: NodeKind },
    /// Remove a node.
    DelNode { name: String },
    /// Rename a node.
    UpdateNode { name: String, new_name: String },
    /// Apply a plugin-defined setting, given as a JSON value.
    NodeSetting { name: String, setting_json: String },
    /// Start or stop a node.
    NodeCtl { name: String, #[arg(long, value_enum)] action: StartStop },

    /// Create a poll group on a driver.
    AddGroup { driver: String, group: String, interval_ms: u32 },
    /// Delete a poll group.
    DelGroup { driver: String, group: String },
    /// Change a poll group's interval.
    UpdateGroup { driver: String, group: String, interval_ms: u32 },

    /// Add one tag to an existing group.
    AddTag {
        driver: String,
        group: String,
        name: String,
        address: String,
        #[arg(long, value_enum)]
        r#type: TagTypeArg,
        #[arg(long = "attr", value_enum, num_args = 1.., value_delimiter = ',')]
        attributes: Vec<TagAttributeArg>,
    },
    /// Remove one tag from a group.
    DelTag { driver: String, group: String, tag: String },
    /// Replace a tag's definition.
    UpdateTag {
        driver: String,
        group: String,
        name: String,
        address: String,
        #[arg(long, value_enum)]
        r#type: TagTypeArg,
        #[arg(long = "attr", value_enum, num_args = 1.., value_delimiter = ',')]
        attributes: Vec<TagAttributeArg>,
    },
    /// Atomically create-if-absent a group and add a batch of tags, given
    /// as a JSON array of `{name,address,type,attribute}` objects.
    AddGtag { driver: String, group: String, interval_ms: u32, tags_json: String },

    /// Subscribe an app to a driver group's change stream.
    SubscribeGroup {
        app: String,
        driver: String,
        group: String,
        #[arg(long)]
        send_when_static: bool,
        /// Publish topic. Required (and must be non-empty) for MQTT apps.
        #[arg(long)]
        topic: Option<String>,
    },
    /// Cancel a subscription.
    UnsubscribeGroup { app: String, driver: String, group: String },
    /// Change an existing subscription's parameters.
    UpdateSubscribeGroup {
        app: String,
        driver: String,
        group: String,
        #[arg(long)]
        send_when_static: bool,
        #[arg(long)]
        topic: Option<String>,
    },

    /// Synchronously read a group's current cached values.
    ReadGroup { driver: String, group: String },
    /// Write one tag, given a JSON value.
    WriteTag { driver: String, group: String, tag: String, value_json: String },
    /// Write several tags, given a JSON object of `{tag: value}`.
    WriteTags { driver: String, group: String, values_json: String },

    /// List all nodes.
    GetNode,
    /// List a driver's groups.
    GetGroup { driver: String },
    /// List a group's tags.
    GetTag { driver: String, group: String },
    /// List an app's subscriptions.
    GetSubGroup { app: String },
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum NodeKind {
    Driver,
    App,
}

impl From<NodeKind> for AdapterType {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Driver => AdapterType::Driver,
            NodeKind::App => AdapterType::App,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum StartStop {
    Start,
    Stop,
}

/// Mirrors `gw_core::tag::TagType`; kept local since `gw-core` has no
/// `clap` dependency and shouldn't gain one just for CLI parsing.
#[derive(Clone, Copy, Debug, clap::ValueEnum, serde::Deserialize)]
#[value(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
enum TagTypeArg {
    Bit,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
    String,
    Bytes,
    Word,
    Dword,
    Lword,
}

impl From<TagTypeArg> for TagType {
    fn from(arg: TagTypeArg) -> Self {
        match arg {
            TagTypeArg::Bit => TagType::Bit,
            TagTypeArg::Bool => TagType::Bool,
            TagTypeArg::Int8 => TagType::Int8,
            TagTypeArg::Int16 => TagType::Int16,
            TagTypeArg::Int32 => TagType::Int32,
            TagTypeArg::Int64 => TagType::Int64,
            TagTypeArg::Uint8 => TagType::Uint8,
            TagTypeArg::Uint16 => TagType::Uint16,
            TagTypeArg::Uint32 => TagType::Uint32,
            TagTypeArg::Uint64 => TagType::Uint64,
            TagTypeArg::Float => TagType::Float,
            TagTypeArg::Double => TagType::Double,
            TagTypeArg::String => TagType::String,
            TagTypeArg::Bytes => TagType::Bytes,
            TagTypeArg::Word => TagType::Word,
            TagTypeArg::Dword => TagType::Dword,
            TagTypeArg::Lword => TagType::Lword,
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum, serde::Deserialize)]
#[value(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
enum TagAttributeArg {
    Read,
    Write,
    Subscribe,
    Static,
}

fn attributes_from_args(args: &[TagAttributeArg]) -> TagAttribute {
    let mut attribute = TagAttribute::empty();
    for arg in args {
        attribute |= match arg {
            TagAttributeArg::Read => TagAttribute::READ,
            TagAttributeArg::Write => TagAttribute::WRITE,
            TagAttributeArg::Subscribe => TagAttribute::SUBSCRIBE,
            TagAttributeArg::Static => TagAttribute::STATIC,
        };
    }
    attribute
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = GatewayClient::new(cli.socket);
    let request = build_request(cli.command)?;

    let response = client.send(request).await.context("request to gatewayd failed")?;
    let success = response.is_success();
    println!("{}", serde_json::to_string_pretty(&response)?);
    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn build_request(command: Command) -> Result<Request> {
    Ok(match command {
        Command::Ping => Request::Ping,

        Command::AddNode { name, plugin, kind } => {
            Request::AddNode { name, plugin, kind: kind.into() }
        }
        Command::DelNode { name } => Request::DelNode { name },
        Command::UpdateNode { name, new_name } => Request::UpdateNode { name, new_name },
        Command::NodeSetting { name, setting_json } => Request::NodeSetting {
            name,
            setting: serde_json::from_str(&setting_json).context("setting must be valid JSON")?,
        },
        Command::NodeCtl { name, action } => {
            Request::NodeCtl { name, start: matches!(action, StartStop::Start) }
        }

        Command::AddGroup { driver, group, interval_ms } => {
            Request::AddGroup { driver, group, interval_ms }
        }
        Command::DelGroup { driver, group } => Request::DelGroup { driver, group },
        Command::UpdateGroup { driver, group, interval_ms } => {
            Request::UpdateGroup { driver, group, interval_ms }
        }

        Command::AddTag { driver, group, name, address, r#type, attributes } => {
            Request::AddTag {
                driver,
                group,
                tag: TagSpec { name, address, r#type: r#type.into(), attribute: attributes_from_args(&attributes) },
            }
        }
        Command::DelTag { driver, group, tag } => Request::DelTag { driver, group, tag },
        Command::UpdateTag { driver, group, name, address, r#type, attributes } => {
            Request::UpdateTag {
                driver,
                group,
                tag: TagSpec { name, address, r#type: r#type.into(), attribute: attributes_from_args(&attributes) },
            }
        }
        Command::AddGtag { driver, group, interval_ms, tags_json } => {
            let specs: Vec<WireTagSpec> =
                serde_json::from_str(&tags_json).context("tags must be a JSON array")?;
            Request::AddGtag {
                driver,
                group,
                interval_ms,
                tags: specs.into_iter().map(WireTagSpec::into_tag_spec).collect(),
            }
        }

        Command::SubscribeGroup { app, driver, group, send_when_static, topic } => {
            Request::SubscribeGroup { app, driver, group, params: SubscribeParams { send_when_static, topic } }
        }
        Command::UnsubscribeGroup { app, driver, group } => {
            Request::UnsubscribeGroup { app, driver, group }
        }
        Command::UpdateSubscribeGroup { app, driver, group, send_when_static, topic } => {
            Request::UpdateSubscribeGroup {
                app,
                driver,
                group,
                params: SubscribeParams { send_when_static, topic },
            }
        }

        Command::ReadGroup { driver, group } => Request::ReadGroup { driver, group },
        Command::WriteTag { driver, group, tag, value_json } => Request::WriteTag {
            driver,
            group,
            tag,
            value: serde_json::from_str(&value_json).context("value must be valid JSON")?,
        },
        Command::WriteTags { driver, group, values_json } => {
            let values: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&values_json).context("values must be a JSON object")?;
            if values.is_empty() {
                bail!("values must contain at least one tag");
            }
            Request::WriteTags {
                driver,
                group,
                values: values.into_iter().collect(),
            }
        }

        Command::GetNode => Request::GetNode,
        Command::GetGroup { driver } => Request::GetGroup { driver },
        Command::GetTag { driver, group } => Request::GetTag { driver, group },
        Command::GetSubGroup { app } => Request::GetSubGroup { app },
    })
}

/// JSON shape accepted by `--tags-json` for `add-gtag`.
#[derive(Debug, serde::Deserialize)]
struct WireTagSpec {
    name: String,
    address: String,
    r#type: TagTypeArg,
    #[serde(default)]
    attributes: Vec<TagAttributeArg>,
}

impl WireTagSpec {
    fn into_tag_spec(self) -> TagSpec {
        TagSpec {
            name: self.name,
            address: self.address,
            r#type: self.r#type.into(),
            attribute: attributes_from_args(&self.attributes),
        }
    }
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
