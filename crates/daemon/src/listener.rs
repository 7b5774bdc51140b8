// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admin-surface listener: accepts Unix-socket connections and dispatches
//! each framed [`gw_wire::Request`] to the [`Manager`], one connection per
//! spawned task. The admin surface is local-only (spec §6) — no TCP, no
//! auth handshake, no connection-upgrading requests.

use std::sync::Arc;
use std::time::Duration;

use gw_wire::{read_framed, write_framed, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

use crate::manager::Manager;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

pub struct Listener {
    unix: UnixListener,
    manager: Arc<Manager>,
}

impl Listener {
    pub fn new(unix: UnixListener, manager: Arc<Manager>) -> Self {
        Listener { unix, manager }
    }

    pub async fn run(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let manager = self.manager.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, &manager).await {
                            log_connection_error(err);
                        }
                    });
                }
                Err(err) => error!(error = %err, "accept failed"),
            }
        }
    }
}

fn log_connection_error(err: ConnectionError) {
    match err {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => debug!("client disconnected"),
        ConnectionError::Protocol(ProtocolError::Timeout) => warn!("request timed out"),
        other => error!(error = %other, "connection error"),
    }
}

async fn handle_connection(mut stream: UnixStream, manager: &Manager) -> Result<(), ConnectionError> {
    let request: Request = read_framed(&mut stream, REQUEST_TIMEOUT).await?;
    if matches!(request, Request::Ping) {
        debug!(?request, "received request");
    } else {
        info!(?request, "received request");
    }

    let response = handle_request(request, manager).await;
    write_framed(&mut stream, &response, REQUEST_TIMEOUT).await?;
    Ok(())
}

/// Dispatches one admin request 1:1 onto the matching [`Manager`] operation.
async fn handle_request(request: Request, manager: &Manager) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::AddNode { name, plugin, kind } => {
            to_response(manager.add_node(&name, &plugin, kind).await)
        }
        Request::DelNode { name } => to_response(manager.del_node(&name).await),
        Request::UpdateNode { name, new_name } => to_response(manager.update_node(&name, &new_name)),
        Request::NodeSetting { name, setting } => to_response(manager.node_setting(&name, setting)),
        Request::NodeCtl { name, start } => to_response(manager.node_ctl(&name, start)),

        Request::AddGroup { driver, group, interval_ms } => {
            to_response(manager.add_group(&driver, &group, interval_ms))
        }
        Request::DelGroup { driver, group } => to_response(manager.del_group(&driver, &group)),
        Request::UpdateGroup { driver, group, interval_ms } => {
            to_response(manager.update_group(&driver, &group, interval_ms))
        }

        Request::AddTag { driver, group, tag } => to_response(manager.add_gtag(&driver, &group, 1000, vec![tag])),
        Request::DelTag { driver, group, tag } => to_response(manager.del_tag(&driver, &group, &tag)),
        Request::UpdateTag { driver, group, tag } => to_response(manager.update_tag(&driver, &group, tag)),
        Request::AddGtag { driver, group, interval_ms, tags } => {
            to_response(manager.add_gtag(&driver, &group, interval_ms, tags))
        }

        Request::SubscribeGroup { app, driver, group, params } => {
            to_response(manager.subscribe_group(&app, &driver, &group, params))
        }
        Request::UnsubscribeGroup { app, driver, group } => {
            to_response(manager.unsubscribe_group(&app, &driver, &group))
        }
        Request::UpdateSubscribeGroup { app, driver, group, params } => {
            to_response(manager.update_subscribe_group(&app, &driver, &group, params))
        }

        Request::ReadGroup { driver, group } => match manager.read_group(&driver, &group) {
            Ok(values) => Response::GroupValues { values },
            Err(err) => Response::error(err.code(), err.to_string()),
        },
        Request::WriteTag { driver, group, tag, value } => {
            to_response(manager.write_tag(&driver, &group, &tag, value).await)
        }
        Request::WriteTags { driver, group, values } => {
            to_response(manager.write_tags(&driver, &group, values).await)
        }

        Request::GetNode => manager.get_node(),
        Request::GetGroup { driver } => result_response(manager.get_group(&driver)),
        Request::GetTag { driver, group } => result_response(manager.get_tag(&driver, &group)),
        Request::GetSubGroup { app } => manager.get_sub_group(&app),
    }
}

fn to_response(result: Result<(), gw_core::GatewayError>) -> Response {
    match result {
        Ok(()) => Response::ok(),
        Err(err) => Response::error(err.code(), err.to_string()),
    }
}

fn result_response(result: Result<Response, gw_core::GatewayError>) -> Response {
    match result {
        Ok(response) => response,
        Err(err) => Response::error(err.code(), err.to_string()),
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
