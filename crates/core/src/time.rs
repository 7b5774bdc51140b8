// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Microsecond wall-clock helpers.
//!
//! The reference design keeps a freestanding `global_timestamp` updated once
//! per tick and read by every driver adapter when stamping `TRANS_DATA`.
//! Per DESIGN NOTES §9 ("Global mutable state"), this is promoted to an
//! explicit, thread-safe value ([`GlobalTimestamp`]) that the manager
//! threads through rather than a bare static.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time in microseconds since the Unix epoch.
pub fn now_us() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_micros() as i64
}

/// A shared, atomically-updated timestamp, refreshed once per event-loop
/// tick and read by driver adapters when stamping `TRANS_DATA` events so
/// that all tags read within the same tick carry an identical timestamp.
#[derive(Debug, Default)]
pub struct GlobalTimestamp(AtomicI64);

impl GlobalTimestamp {
    pub fn new() -> Self {
        GlobalTimestamp(AtomicI64::new(now_us()))
    }

    pub fn refresh(&self) -> i64 {
        let ts = now_us();
        self.0.store(ts, Ordering::Relaxed);
        ts
    }

    pub fn get(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}
