// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire-protocol client: one request per connection over the admin Unix
//! socket (spec §6), mirroring the framing `gw-daemon::listener` speaks.

use std::path::PathBuf;
use std::time::Duration;

use gw_wire::{read_framed, write_framed, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to connect to {path}: {source}")]
    Connect { path: String, source: std::io::Error },
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

pub struct GatewayClient {
    socket_path: PathBuf,
}

impl GatewayClient {
    pub fn new(socket_path: PathBuf) -> Self {
        GatewayClient { socket_path }
    }

    pub async fn send(&self, request: Request) -> Result<Response, ClientError> {
        let mut stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|source| ClientError::Connect { path: self.socket_path.display().to_string(), source })?;
        write_framed(&mut stream, &request, REQUEST_TIMEOUT).await?;
        Ok(read_framed(&mut stream, REQUEST_TIMEOUT).await?)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
