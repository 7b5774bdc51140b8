// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event loop (spec §4.1): timer and I/O-task registration over `tokio`.
//!
//! The reference implementation carries separate epoll/kqueue reactors
//! behind one interface because C has no portable async runtime; `tokio`
//! already is that portability layer, so `add_timer`/`add_io` are thin
//! wrappers over `tokio::spawn` and `tokio::time::interval`.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};

use gw_plugins::TimerType;
use parking_lot::Mutex;
use std::collections::HashMap;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::Duration;

pub type TimerId = u64;
pub type IoId = u64;

type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReactorError {
    #[error("reactor is at capacity ({0} slots)")]
    Full(usize),
    #[error("reactor is closed")]
    Closed,
}

struct Slot {
    handle: JoinHandle<()>,
}

/// Bounded registry of timer and I/O tasks, mirroring the reference
/// implementation's fixed-size slot table (design target: 1400 slots).
pub struct Reactor {
    slots: usize,
    next_id: AtomicU64,
    tasks: Mutex<HashMap<u64, Slot>>,
    closed: Mutex<bool>,
}

impl Reactor {
    pub fn new(slots: usize) -> Self {
        Reactor { slots, next_id: AtomicU64::new(1), tasks: Mutex::new(HashMap::new()), closed: Mutex::new(false) }
    }

    fn reserve_id(&self) -> Result<u64, ReactorError> {
        if *self.closed.lock() {
            return Err(ReactorError::Closed);
        }
        if self.tasks.lock().len() >= self.slots {
            return Err(ReactorError::Full(self.slots));
        }
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a repeating timer. `BLOCK` runs one callback to completion
    /// before sleeping for the next tick; `NONBLOCK` spawns a fresh task on
    /// every tick regardless of whether the previous one finished.
    pub fn add_timer<F, Fut>(&self, interval_ms: u32, kind: TimerType, mut callback: F) -> Result<TimerId, ReactorError>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.reserve_id()?;
        let period = Duration::from_millis(interval_ms.max(1) as u64);

        let handle = match kind {
            TimerType::Block => tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    callback().await;
                }
            }),
            TimerType::NonBlock => tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                loop {
                    ticker.tick().await;
                    let fut: BoxFuture = Box::pin(callback());
                    tokio::spawn(fut);
                }
            }),
        };

        self.tasks.lock().insert(id, Slot { handle });
        Ok(id)
    }

    pub fn del_timer(&self, id: TimerId) {
        if let Some(slot) = self.tasks.lock().remove(&id) {
            slot.handle.abort();
        }
    }

    /// Registers a single long-running I/O task (e.g. one accepted
    /// connection's read loop). Unlike timers, the future runs once; the
    /// reactor tracks it only so `close()` can cancel it.
    pub fn add_io<Fut>(&self, task: Fut) -> Result<IoId, ReactorError>
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let id = self.reserve_id()?;
        let handle = tokio::spawn(task);
        self.tasks.lock().insert(id, Slot { handle });
        Ok(id)
    }

    pub fn del_io(&self, id: IoId) {
        self.del_timer(id);
    }

    pub fn active_count(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Aborts every registered timer and I/O task and rejects further
    /// registration.
    pub fn close(&self) {
        *self.closed.lock() = true;
        for (_, slot) in self.tasks.lock().drain() {
            slot.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::Notify;

    #[tokio::test]
    async fn block_timer_fires_repeatedly() {
        let reactor = Reactor::new(4);
        let count = Arc::new(AtomicU64::new(0));
        let notify = Arc::new(Notify::new());

        let count2 = count.clone();
        let notify2 = notify.clone();
        reactor
            .add_timer(5, TimerType::Block, move || {
                let count = count2.clone();
                let notify = notify2.clone();
                async move {
                    if count.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                        notify.notify_one();
                    }
                }
            })
            .unwrap();

        tokio::time::timeout(Duration::from_secs(1), notify.notified()).await.unwrap();
        reactor.close();
    }

    #[tokio::test]
    async fn del_timer_stops_future_ticks() {
        let reactor = Reactor::new(4);
        let count = Arc::new(AtomicU64::new(0));
        let count2 = count.clone();
        let id = reactor
            .add_timer(5, TimerType::Block, move || {
                let count = count2.clone();
                async move {
                    count.fetch_add(1, Ordering::SeqCst);
                }
            })
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        reactor.del_timer(id);
        let after_stop = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[tokio::test]
    async fn registration_past_capacity_is_rejected() {
        let reactor = Reactor::new(1);
        reactor.add_timer(1000, TimerType::Block, || async {}).unwrap();
        let err = reactor.add_timer(1000, TimerType::Block, || async {}).unwrap_err();
        assert_eq!(err, ReactorError::Full(1));
        reactor.close();
    }

    #[tokio::test]
    async fn closed_reactor_rejects_registration() {
        let reactor = Reactor::new(4);
        reactor.close();
        let err = reactor.add_timer(1000, TimerType::Block, || async {}).unwrap_err();
        assert_eq!(err, ReactorError::Closed);
    }
}
