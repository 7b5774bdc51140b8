// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metric data model (spec §4.1, §9): entry shape and the bucketed rolling
//! counter. The process-wide registry that owns and exposes these lives in
//! `gw-daemon`; this crate only defines the primitives it registers.

use parking_lot::Mutex;

use crate::time::now_us;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Gauge,
    RollingCounter { window_ms: u32 },
}

#[derive(Debug, Clone)]
pub struct MetricEntry {
    pub name: String,
    pub help: String,
    pub kind: MetricKind,
}

impl MetricEntry {
    pub fn new(name: impl Into<String>, help: impl Into<String>, kind: MetricKind) -> Self {
        MetricEntry { name: name.into(), help: help.into(), kind }
    }
}

/// A bucketed sliding-window counter (spec §9): the window is split into a
/// fixed number of buckets; `incr` advances past stale buckets (zeroing
/// them) before adding to the current one; `sum` totals the non-stale
/// buckets. Bucket width is `window_ms / BUCKETS`.
const BUCKETS: usize = 6;

struct RollingInner {
    window_ms: i64,
    bucket_ms: i64,
    buckets: Vec<u64>,
    /// Microsecond timestamp of the start of `buckets[head]`.
    head_start_us: i64,
    head: usize,
}

pub struct RollingCounter {
    inner: Mutex<RollingInner>,
}

impl RollingCounter {
    pub fn new(window_ms: u32) -> Self {
        let window_ms = window_ms as i64;
        let bucket_ms = (window_ms / BUCKETS as i64).max(1);
        RollingCounter {
            inner: Mutex::new(RollingInner {
                window_ms,
                bucket_ms,
                buckets: vec![0; BUCKETS],
                head_start_us: now_us(),
                head: 0,
            }),
        }
    }

    /// Advances the window to `now`, zeroing any bucket whose slot has
    /// aged out, then adds `amount` to the current bucket.
    pub fn incr(&self, amount: u64) {
        let mut inner = self.inner.lock();
        Self::advance(&mut inner, now_us());
        let head = inner.head;
        inner.buckets[head] += amount;
    }

    /// Sums all buckets still within the window as of `now`.
    pub fn sum(&self) -> u64 {
        let mut inner = self.inner.lock();
        Self::advance(&mut inner, now_us());
        inner.buckets.iter().sum()
    }

    fn advance(inner: &mut RollingInner, now_us: i64) {
        let bucket_us = inner.bucket_ms * 1_000;
        let mut elapsed = now_us - inner.head_start_us;
        if elapsed < bucket_us {
            return;
        }
        let total_buckets = BUCKETS as i64;
        let mut steps = elapsed / bucket_us;
        if steps > total_buckets {
            steps = total_buckets;
        }
        for _ in 0..steps {
            inner.head = (inner.head + 1) % BUCKETS;
            inner.buckets[inner.head] = 0;
        }
        elapsed -= steps * bucket_us;
        inner.head_start_us = now_us - elapsed;
    }
}
