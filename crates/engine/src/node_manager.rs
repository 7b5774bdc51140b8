// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node manager (spec §4.6): the authoritative table of live adapter
//! instances, keyed by name.

use std::collections::HashMap;

use gw_core::{AdapterState, AdapterType, GatewayError};
use gw_wire::Envelope;
use parking_lot::RwLock;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub struct NodeEntry {
    pub name: String,
    pub plugin: String,
    pub kind: AdapterType,
    pub state: AdapterState,
    /// Whether the owning plugin module is single-instance
    /// (`PluginDescriptor::single`); enforced by the manager at add time.
    pub single: bool,
    pub addr: mpsc::Sender<Envelope>,
}

#[derive(Default)]
pub struct NodeManager {
    nodes: RwLock<HashMap<String, NodeEntry>>,
}

impl NodeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, entry: NodeEntry) -> Result<(), GatewayError> {
        let mut nodes = self.nodes.write();
        if nodes.contains_key(&entry.name) {
            return Err(GatewayError::NodeExist);
        }
        nodes.insert(entry.name.clone(), entry);
        Ok(())
    }

    pub fn del(&self, name: &str) -> Result<NodeEntry, GatewayError> {
        self.nodes.write().remove(name).ok_or(GatewayError::NodeNotExist)
    }

    pub fn find(&self, name: &str) -> Option<NodeEntry> {
        self.nodes.read().get(name).cloned()
    }

    pub fn filter(&self, mut predicate: impl FnMut(&NodeEntry) -> bool) -> Vec<NodeEntry> {
        self.nodes.read().values().filter(|entry| predicate(entry)).cloned().collect()
    }

    pub fn get_addr(&self, name: &str) -> Option<mpsc::Sender<Envelope>> {
        self.nodes.read().get(name).map(|entry| entry.addr.clone())
    }

    pub fn is_driver(&self, name: &str) -> bool {
        self.find(name).is_some_and(|entry| entry.kind == AdapterType::Driver)
    }

    pub fn is_single(&self, plugin: &str) -> bool {
        self.nodes.read().values().any(|entry| entry.plugin == plugin && entry.single)
    }

    pub fn update_name(&self, old: &str, new: &str) -> Result<(), GatewayError> {
        let mut nodes = self.nodes.write();
        if nodes.contains_key(new) {
            return Err(GatewayError::NodeExist);
        }
        let mut entry = nodes.remove(old).ok_or(GatewayError::NodeNotExist)?;
        entry.name = new.to_string();
        nodes.insert(new.to_string(), entry);
        Ok(())
    }

    pub fn set_state(&self, name: &str, state: AdapterState) -> Result<(), GatewayError> {
        let mut nodes = self.nodes.write();
        let entry = nodes.get_mut(name).ok_or(GatewayError::NodeNotExist)?;
        entry.state = state;
        Ok(())
    }

    pub fn names(&self) -> Vec<String> {
        self.nodes.read().keys().cloned().collect()
    }
}
