// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription manager (spec §4.7): two indices (by-app, by-driver) over
//! one subscription table, behind a single `RwLock` so the indices can
//! never drift out of sync with each other — there is exactly one write
//! path and it updates all three maps together.

use std::collections::HashMap;

use gw_core::{GatewayError, SubscribeParams, Subscription, SubscriptionId};
use parking_lot::RwLock;

struct Inner {
    subs: HashMap<SubscriptionId, Subscription>,
    by_app: HashMap<String, Vec<SubscriptionId>>,
    by_driver: HashMap<String, Vec<SubscriptionId>>,
}

impl Inner {
    fn index(&mut self, sub: &Subscription) {
        self.by_app.entry(sub.app_name.clone()).or_default().push(sub.id);
        self.by_driver.entry(sub.driver_name.clone()).or_default().push(sub.id);
    }

    fn deindex(&mut self, sub: &Subscription) {
        if let Some(ids) = self.by_app.get_mut(&sub.app_name) {
            ids.retain(|id| *id != sub.id);
        }
        if let Some(ids) = self.by_driver.get_mut(&sub.driver_name) {
            ids.retain(|id| *id != sub.id);
        }
    }
}

#[derive(Default)]
pub struct SubscriptionManager {
    inner: RwLock<Inner>,
}

impl Default for Inner {
    fn default() -> Self {
        Inner { subs: HashMap::new(), by_app: HashMap::new(), by_driver: HashMap::new() }
    }
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unique on (driver, group, app) (spec §3): subscribing an
    /// already-subscribed tuple again returns the existing id rather than
    /// creating a second `Subscription`, so pollers never fan `TRANS_DATA`
    /// out twice for the same app on the same tick.
    pub fn sub(&self, driver: &str, group: &str, app: &str) -> SubscriptionId {
        let mut inner = self.inner.write();
        if let Some(existing) = inner.by_driver.get(driver).and_then(|ids| {
            ids.iter().find(|id| inner.subs.get(id).is_some_and(|s| s.matches(driver, group, app))).copied()
        }) {
            return existing;
        }
        let sub = Subscription::new(driver, group, app);
        let id = sub.id;
        inner.index(&sub);
        inner.subs.insert(id, sub);
        id
    }

    pub fn unsub(&self, id: SubscriptionId) -> Option<Subscription> {
        let mut inner = self.inner.write();
        let sub = inner.subs.remove(&id)?;
        inner.deindex(&sub);
        Some(sub)
    }

    /// Removes every subscription belonging to `app`, returning them (used
    /// on app node deletion).
    pub fn unsub_all(&self, app: &str) -> Vec<Subscription> {
        let mut inner = self.inner.write();
        let ids = inner.by_app.remove(app).unwrap_or_default();
        let mut removed = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(sub) = inner.subs.remove(&id) {
                if let Some(driver_ids) = inner.by_driver.get_mut(&sub.driver_name) {
                    driver_ids.retain(|existing| *existing != id);
                }
                removed.push(sub);
            }
        }
        removed
    }

    pub fn update_params(&self, id: SubscriptionId, params: SubscribeParams) -> Result<(), GatewayError> {
        let mut inner = self.inner.write();
        let sub = inner.subs.get_mut(&id).ok_or(GatewayError::GroupNotSubscribe)?;
        sub.params = params;
        Ok(())
    }

    pub fn update_driver_name(&self, old: &str, new: &str) {
        let mut inner = self.inner.write();
        if let Some(ids) = inner.by_driver.remove(old) {
            for id in &ids {
                if let Some(sub) = inner.subs.get_mut(id) {
                    sub.driver_name = new.to_string();
                }
            }
            inner.by_driver.insert(new.to_string(), ids);
        }
    }

    pub fn update_app_name(&self, old: &str, new: &str) {
        let mut inner = self.inner.write();
        if let Some(ids) = inner.by_app.remove(old) {
            for id in &ids {
                if let Some(sub) = inner.subs.get_mut(id) {
                    sub.app_name = new.to_string();
                }
            }
            inner.by_app.insert(new.to_string(), ids);
        }
    }

    pub fn update_group_name(&self, driver: &str, old_group: &str, new_group: &str) {
        let mut inner = self.inner.write();
        let ids = inner.by_driver.get(driver).cloned().unwrap_or_default();
        for id in ids {
            if let Some(sub) = inner.subs.get_mut(&id) {
                if sub.group_name == old_group {
                    sub.group_name = new_group.to_string();
                }
            }
        }
    }

    pub fn find_by_driver(&self, driver: &str) -> Vec<Subscription> {
        let inner = self.inner.read();
        inner
            .by_driver
            .get(driver)
            .map(|ids| ids.iter().filter_map(|id| inner.subs.get(id).cloned()).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, id: SubscriptionId) -> Option<Subscription> {
        self.inner.read().subs.get(&id).cloned()
    }
}
