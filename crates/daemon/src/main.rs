// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `gatewayd`: binds the admin Unix socket, replays persisted state, and
//! serves admin requests until the process is signaled to stop.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use gw_daemon::{persistence, Config, Listener, Manager};
use gw_engine::Reactor;
use gw_plugins::PluginRegistry;
use tokio::net::UnixListener;
use tracing_subscriber::EnvFilter;

/// Default slot count for the reactor's timer/IO table (design target,
/// spec §4.1).
const REACTOR_SLOTS: usize = 1400;

#[derive(Parser, Debug)]
#[command(name = "gatewayd", about = "Industrial IoT edge gateway daemon")]
struct Args {
    /// Path to the TOML bootstrap config. Missing file falls back to defaults.
    #[arg(long, default_value = "/etc/gatewayd/config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("warning: {err}, using defaults");
            Config::default()
        }
    };

    tracing_subscriber::fmt().with_env_filter(EnvFilter::new(&config.log_level)).init();

    std::fs::create_dir_all(&config.data_dir)?;
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let (wal, state) = persistence::load(&config.data_dir)?;
    let registry = Arc::new(PluginRegistry::with_builtins());
    let reactor = Arc::new(Reactor::new(REACTOR_SLOTS));
    let manager = Arc::new(Manager::new(registry, reactor, wal));
    manager.replay(&state).await;
    tracing::info!(nodes = state.nodes.len(), "replayed persisted state");

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let unix = UnixListener::bind(&config.socket_path)?;
    tracing::info!(socket = %config.socket_path.display(), "admin socket bound");

    persistence::spawn_checkpointer(manager.clone(), config.data_dir.clone(), config.checkpoint_interval());

    Listener::new(unix, manager).run().await;
    Ok(())
}
