// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process message bus (spec §4.2, DESIGN NOTES §9 "Message bus via
//! pointer passing"): a receiver's bus address is simply its
//! `mpsc::Sender` handle, registered here under its node name. Replaces
//! the reference implementation's raw pointer-passing, which only made
//! sense because every adapter lived in one C process's address space —
//! Rust adapters already share a process here, so a typed channel gets
//! the same locality without the unsafety.

use std::collections::HashMap;

use gw_wire::Envelope;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::mpsc;

pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("no receiver registered under name {0:?}")]
    UnknownReceiver(String),
    #[error("receiver {0:?} is no longer accepting messages")]
    ReceiverClosed(String),
}

/// Registry of per-node mailboxes. Per-(sender,receiver) delivery is FIFO
/// because each receiver owns exactly one `mpsc` queue; order across
/// distinct senders delivering to the same receiver is unspecified.
#[derive(Default)]
pub struct Bus {
    mailboxes: RwLock<HashMap<String, mpsc::Sender<Envelope>>>,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`'s mailbox, returning the receiving half. Replaces
    /// any prior registration under the same name (e.g. node re-add after
    /// delete).
    pub fn register(&self, name: impl Into<String>, capacity: usize) -> mpsc::Receiver<Envelope> {
        let (tx, rx) = mpsc::channel(capacity);
        self.mailboxes.write().insert(name.into(), tx);
        rx
    }

    pub fn unregister(&self, name: &str) {
        self.mailboxes.write().remove(name);
    }

    pub fn address_of(&self, name: &str) -> Option<mpsc::Sender<Envelope>> {
        self.mailboxes.read().get(name).cloned()
    }

    /// Routes `envelope` to its header's `receiver`, per spec §4.2's
    /// `Header.receiver` field.
    pub async fn send(&self, envelope: Envelope) -> Result<(), BusError> {
        let receiver = envelope.header.receiver.clone();
        let sender = self
            .mailboxes
            .read()
            .get(&receiver)
            .cloned()
            .ok_or_else(|| BusError::UnknownReceiver(receiver.clone()))?;
        sender.send(envelope).await.map_err(|_| BusError::ReceiverClosed(receiver))
    }
}
