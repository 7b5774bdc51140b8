// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-global metrics registry (spec §9): owns the counter/gauge/
//! rolling-counter instances [`gw_core::metrics`] defines the shape of,
//! keyed by name. Rolling counters are node-scoped and refcounted so a
//! node's series drops out of exposition once the last node referencing it
//! is gone, instead of lingering at its last value forever.
//!
//! Exposition is a standalone render step kept separate from the
//! bookkeeping above it, so the wire format at the admin surface (spec §6)
//! can change without touching how metrics are registered or updated.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use gw_core::{MetricEntry, MetricKind, RollingCounter};
use parking_lot::RwLock;

/// Rolling-counter windows every node-scoped rate metric tracks (spec §9).
const ROLLING_WINDOWS_MS: [u32; 3] = [5_000, 30_000, 60_000];

enum MetricStorage {
    Counter(AtomicU64),
    Gauge(AtomicI64),
    Rolling([RollingCounter; 3]),
}

struct MetricSlot {
    entry: MetricEntry,
    storage: MetricStorage,
    refs: u64,
}

/// Owns every metric instance the daemon exposes. Process-wide counters and
/// gauges are created on first use and never removed; rolling counters are
/// acquired/released by name, one acquisition per node that references them.
#[derive(Default)]
pub struct MetricsRegistry {
    slots: RwLock<HashMap<String, MetricSlot>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        MetricsRegistry::default()
    }

    pub fn incr_counter(&self, name: &str, help: &str, amount: u64) {
        let mut slots = self.slots.write();
        let slot = slots.entry(name.to_string()).or_insert_with(|| MetricSlot {
            entry: MetricEntry::new(name, help, MetricKind::Counter),
            storage: MetricStorage::Counter(AtomicU64::new(0)),
            refs: 0,
        });
        if let MetricStorage::Counter(counter) = &slot.storage {
            counter.fetch_add(amount, Ordering::Relaxed);
        }
    }

    pub fn set_gauge(&self, name: &str, help: &str, value: i64) {
        let mut slots = self.slots.write();
        let slot = slots.entry(name.to_string()).or_insert_with(|| MetricSlot {
            entry: MetricEntry::new(name, help, MetricKind::Gauge),
            storage: MetricStorage::Gauge(AtomicI64::new(0)),
            refs: 0,
        });
        if let MetricStorage::Gauge(gauge) = &slot.storage {
            gauge.store(value, Ordering::Relaxed);
        }
    }

    /// Registers (if absent) a node-scoped rolling-counter family and bumps
    /// its refcount. Call [`release_rolling`](Self::release_rolling) with
    /// the same name when the node that acquired it is deleted.
    pub fn acquire_rolling(&self, name: &str, help: &str) {
        let mut slots = self.slots.write();
        let slot = slots.entry(name.to_string()).or_insert_with(|| MetricSlot {
            entry: MetricEntry::new(name, help, MetricKind::RollingCounter { window_ms: ROLLING_WINDOWS_MS[2] }),
            storage: MetricStorage::Rolling(ROLLING_WINDOWS_MS.map(RollingCounter::new)),
            refs: 0,
        });
        slot.refs += 1;
    }

    /// Releases one reference to a node-scoped rolling-counter family,
    /// removing it from the registry once the last referent lets go.
    pub fn release_rolling(&self, name: &str) {
        let mut slots = self.slots.write();
        let Some(slot) = slots.get_mut(name) else { return };
        slot.refs = slot.refs.saturating_sub(1);
        if slot.refs == 0 {
            slots.remove(name);
        }
    }

    pub fn incr_rolling(&self, name: &str, amount: u64) {
        let slots = self.slots.read();
        if let Some(MetricSlot { storage: MetricStorage::Rolling(windows), .. }) = slots.get(name) {
            for window in windows {
                window.incr(amount);
            }
        }
    }

    /// Renders every registered metric in Prometheus text exposition
    /// format, sorted by name for stable output.
    pub fn render_prometheus(&self) -> String {
        let slots = self.slots.read();
        let mut names: Vec<&String> = slots.keys().collect();
        names.sort();

        let mut out = String::new();
        for name in names {
            let slot = &slots[name];
            let metric_name = sanitize(name);
            out.push_str(&format!("# HELP {metric_name} {}\n", slot.entry.help));
            match &slot.storage {
                MetricStorage::Counter(counter) => {
                    out.push_str(&format!("# TYPE {metric_name} counter\n"));
                    out.push_str(&format!("{metric_name} {}\n", counter.load(Ordering::Relaxed)));
                }
                MetricStorage::Gauge(gauge) => {
                    out.push_str(&format!("# TYPE {metric_name} gauge\n"));
                    out.push_str(&format!("{metric_name} {}\n", gauge.load(Ordering::Relaxed)));
                }
                MetricStorage::Rolling(windows) => {
                    out.push_str(&format!("# TYPE {metric_name} gauge\n"));
                    for (window_ms, window) in ROLLING_WINDOWS_MS.iter().zip(windows.iter()) {
                        out.push_str(&format!("{metric_name}{{window_ms=\"{window_ms}\"}} {}\n", window.sum()));
                    }
                }
            }
        }
        out
    }
}

fn sanitize(name: &str) -> String {
    name.chars().map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == ':' { c } else { '_' }).collect()
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
