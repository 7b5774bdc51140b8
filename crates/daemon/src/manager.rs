// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Top-level manager (spec §4.8): the single admin write path. One
//! `tokio::sync::Mutex` serializes every mutating operation end to end —
//! admin flows `.await` plugin `init`/`uninit`, so the lock must be
//! async-aware, matching the teacher's `Executor`'s single-writer model
//! over `MaterializedState`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use gw_core::{AdapterState, AdapterType, GatewayError, SubscribeParams, Tag};
use gw_engine::{AppAdapter, Bus, DriverAdapter, NodeEntry, NodeManager, Reactor, Route, SubscriptionManager, TimerId};
use gw_plugins::{DownstreamOp, DownstreamResult, PluginRegistry, TagSample};
use gw_storage::{GatewayEvent, MaterializedState, TagDelta, Wal};
use gw_wire::{GroupSummary, NodeSummary, Response, TagSpec, TagValue};
use parking_lot::RwLock;
use tokio::sync::Mutex as AsyncMutex;

use crate::metrics::MetricsRegistry;

pub struct Manager {
    write_lock: AsyncMutex<()>,
    nodes: Arc<NodeManager>,
    subscriptions: Arc<SubscriptionManager>,
    bus: Arc<Bus>,
    registry: Arc<PluginRegistry>,
    reactor: Arc<Reactor>,
    drivers: RwLock<HashMap<String, Arc<DriverAdapter>>>,
    apps: RwLock<HashMap<String, Arc<AppAdapter>>>,
    timers: RwLock<HashMap<(String, String), TimerId>>,
    /// I/O slots for each app's mailbox-drain task, so `del_node` can cancel
    /// them instead of leaking a task blocked on a dead receiver.
    dispatch_tasks: RwLock<HashMap<String, gw_engine::IoId>>,
    wal: parking_lot::Mutex<Wal>,
    metrics: Arc<MetricsRegistry>,
    /// Mirrors every applied [`GatewayEvent`] so a checkpoint can snapshot
    /// the materialized state without re-deriving it from the live engine
    /// structures.
    state: parking_lot::Mutex<MaterializedState>,
    /// Set for the duration of [`Manager::replay`] so events re-applied from
    /// a snapshot/WAL don't get appended back to the WAL a second time.
    suppress_wal: AtomicBool,
}

fn poll_errors_metric(driver: &str) -> String {
    format!("gw_driver_poll_errors_total_{driver}")
}

/// `SEND_MSG_ERRORS_TOTAL` per app (spec §4.5): bumped on an absent route
/// (drop) or a publish failure.
fn send_errors_metric(app: &str) -> String {
    format!("gw_app_send_errors_total_{app}")
}

/// One member of an `add_drivers` atomic batch.
pub struct DriverSpec {
    pub name: String,
    pub plugin: String,
}

impl Manager {
    pub fn new(registry: Arc<PluginRegistry>, reactor: Arc<Reactor>, wal: Wal) -> Self {
        Manager {
            write_lock: AsyncMutex::new(()),
            nodes: Arc::new(NodeManager::new()),
            subscriptions: Arc::new(SubscriptionManager::new()),
            bus: Arc::new(Bus::new()),
            registry,
            reactor,
            drivers: RwLock::new(HashMap::new()),
            apps: RwLock::new(HashMap::new()),
            timers: RwLock::new(HashMap::new()),
            dispatch_tasks: RwLock::new(HashMap::new()),
            wal: parking_lot::Mutex::new(wal),
            metrics: Arc::new(MetricsRegistry::new()),
            state: parking_lot::Mutex::new(MaterializedState::default()),
            suppress_wal: AtomicBool::new(false),
        }
    }

    pub fn nodes(&self) -> &NodeManager {
        &self.nodes
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Current write position and a clone of the materialized state, for a
    /// checkpoint to snapshot without racing concurrent admin operations
    /// (both are read under their own lock, which is good enough since a
    /// snapshot a few events stale just replays a little more WAL next boot).
    pub fn checkpoint_source(&self) -> (u64, MaterializedState) {
        (self.wal.lock().write_seq(), self.state.lock().clone())
    }

    pub fn truncate_wal_before(&self, keep_from: u64) {
        let mut wal = self.wal.lock();
        wal.mark_processed(keep_from.saturating_sub(1));
        if let Err(err) = wal.truncate_before(keep_from) {
            tracing::error!(error = %err, "failed to truncate WAL after checkpoint");
        }
    }

    /// Replays a materialized state (snapshot plus any WAL entries newer
    /// than it) onto a freshly constructed `Manager`, rebuilding every node,
    /// group, tag and subscription through the normal admin methods.
    /// Per-item failures are logged and skipped rather than aborting the
    /// whole replay (boot resilience invariant, spec §6): a node that no
    /// longer loads shouldn't keep every other node from coming back.
    pub async fn replay(&self, snapshot: &MaterializedState) {
        self.suppress_wal.store(true, Ordering::SeqCst);

        let mut nodes: Vec<_> = snapshot.nodes.values().collect();
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        for node in nodes {
            if let Err(err) = self.add_node(&node.name, &node.plugin, node.kind).await {
                tracing::error!(node = node.name, error = %err, "skipping node during replay");
                continue;
            }
            if let Some(setting) = node.setting.clone() {
                if let Err(err) = self.node_setting(&node.name, setting) {
                    tracing::error!(node = node.name, error = %err, "skipping setting during replay");
                }
            }
        }

        let mut drivers: Vec<_> = snapshot.groups.keys().collect();
        drivers.sort();
        for driver in drivers {
            let mut groups: Vec<_> = snapshot.groups[driver].values().collect();
            groups.sort_by(|a, b| a.name.cmp(&b.name));
            for group in groups {
                if let Err(err) = self.add_group(driver, &group.name, group.interval_ms) {
                    tracing::error!(driver, group = group.name, error = %err, "skipping group during replay");
                    continue;
                }
                let mut tags: Vec<_> = group.tags.values().collect();
                tags.sort_by(|a, b| a.name.cmp(&b.name));
                for tag in tags {
                    let spec = TagSpec { name: tag.name.clone(), address: tag.address.clone(), r#type: tag.r#type, attribute: tag.attribute };
                    if let Err(err) = self.add_gtag(driver, &group.name, group.interval_ms, vec![spec]) {
                        tracing::error!(driver, group = group.name, tag = tag.name, error = %err, "skipping tag during replay");
                    }
                }
            }
        }

        for sub in &snapshot.subscriptions {
            if let Err(err) = self.subscribe_group(&sub.app, &sub.driver, &sub.group, sub.params.clone()) {
                tracing::error!(app = sub.app, driver = sub.driver, group = sub.group, error = %err, "skipping subscription during replay");
            }
        }

        *self.state.lock() = snapshot.clone();
        self.suppress_wal.store(false, Ordering::SeqCst);
    }

    fn update_node_count_gauge(&self) {
        self.metrics.set_gauge("gw_node_count", "nodes currently registered", self.nodes.filter(|_| true).len() as i64);
    }

    fn append(&self, event: GatewayEvent) {
        self.state.lock().apply_event(&event);
        if self.suppress_wal.load(Ordering::Relaxed) {
            return;
        }
        if let Err(err) = self.wal.lock().append(&event) {
            tracing::error!(error = %err, "failed to append WAL entry");
        }
    }

    pub async fn add_node(&self, name: &str, plugin: &str, kind: AdapterType) -> Result<(), GatewayError> {
        let _guard = self.write_lock.lock().await;
        self.add_node_locked(name, plugin, kind).await
    }

    async fn add_node_locked(&self, name: &str, plugin: &str, kind: AdapterType) -> Result<(), GatewayError> {
        let addr = match kind {
            AdapterType::Driver => {
                let driver = self.registry.instantiate_driver(plugin)?;
                let descriptor = driver.descriptor().clone();
                if descriptor.single && self.nodes.is_single(plugin) {
                    return Err(GatewayError::NodeNotAllow);
                }
                let adapter = Arc::new(DriverAdapter::new(name, driver, self.bus.clone(), self.subscriptions.clone()));
                self.drivers.write().insert(name.to_string(), adapter);
                // Nothing addresses driver mailboxes in this design — admin
                // ops call the adapter directly — so the registered address
                // is a sink no one will ever read from.
                let (addr, _rx) = tokio::sync::mpsc::channel(1);
                (addr, descriptor.single)
            }
            AdapterType::App => {
                let app = self.registry.instantiate_app(plugin)?;
                let descriptor = app.descriptor().clone();
                if descriptor.single && self.nodes.is_single(plugin) {
                    return Err(GatewayError::NodeNotAllow);
                }
                let adapter = Arc::new(AppAdapter::new(name, app));
                self.apps.write().insert(name.to_string(), adapter.clone());
                let mut rx = self.bus.register(name, gw_engine::DEFAULT_MAILBOX_CAPACITY);
                // `register` just inserted this mailbox under the same address table.
                #[allow(clippy::expect_used)]
                let addr = self.bus.address_of(name).expect("just registered");
                let metrics = self.metrics.clone();
                let metric_name = send_errors_metric(name);
                let task_id = self
                    .reactor
                    .add_io(async move {
                        while let Some(envelope) = rx.recv().await {
                            if let gw_wire::BusBody::Event(event) = envelope.body {
                                match adapter.dispatch(event).await {
                                    Ok(true) => {}
                                    Ok(false) | Err(_) => metrics.incr_rolling(&metric_name, 1),
                                }
                            }
                        }
                    })
                    .map_err(|_| GatewayError::EInternal)?;
                self.dispatch_tasks.write().insert(name.to_string(), task_id);
                (addr, descriptor.single)
            }
        };
        let (addr, single) = addr;

        self.nodes
            .add(NodeEntry { name: name.to_string(), plugin: plugin.to_string(), kind, state: AdapterState::Idle, single, addr })
            .map_err(|e| {
                self.drivers.write().remove(name);
                self.apps.write().remove(name);
                self.bus.unregister(name);
                if let Some(id) = self.dispatch_tasks.write().remove(name) {
                    self.reactor.del_io(id);
                }
                e
            })?;

        if kind == AdapterType::Driver {
            self.metrics.acquire_rolling(&poll_errors_metric(name), "driver group poll failures");
        } else {
            self.metrics.acquire_rolling(&send_errors_metric(name), "app publish failures and dropped routeless sends");
        }
        self.metrics.incr_counter("gw_nodes_added_total", "nodes added over the daemon's lifetime", 1);
        self.update_node_count_gauge();

        self.append(GatewayEvent::AddNode { name: name.to_string(), plugin: plugin.to_string(), kind });
        tracing::info!(node = name, plugin, kind = ?kind, "node added");
        Ok(())
    }

    pub async fn del_node(&self, name: &str) -> Result<(), GatewayError> {
        let _guard = self.write_lock.lock().await;
        let removed = self.nodes.del(name)?;
        if removed.kind == AdapterType::Driver {
            self.metrics.release_rolling(&poll_errors_metric(name));
        } else {
            self.metrics.release_rolling(&send_errors_metric(name));
        }
        self.drivers.write().remove(name);
        self.apps.write().remove(name);
        self.bus.unregister(name);
        if let Some(id) = self.dispatch_tasks.write().remove(name) {
            self.reactor.del_io(id);
        }

        // Exactly one NODE_DELETED per app (spec §8.2), even if the app
        // holds several subscriptions against this driver.
        let mut notified_apps = std::collections::HashSet::new();
        for sub in self.subscriptions.find_by_driver(name) {
            if notified_apps.insert(sub.app_name.clone()) {
                let envelope = gw_wire::Envelope::event(name, &sub.app_name, gw_wire::BusEvent::NodeDeleted { node: name.to_string() });
                let _ = self.bus.send(envelope).await;
            }
            self.subscriptions.unsub(sub.id);
        }
        for sub in self.subscriptions.unsub_all(name) {
            self.append(GatewayEvent::DelSubscription { app: sub.app_name, driver: sub.driver_name, group: sub.group_name });
        }

        self.metrics.incr_counter("gw_nodes_deleted_total", "nodes deleted over the daemon's lifetime", 1);
        self.update_node_count_gauge();

        self.append(GatewayEvent::DelNode { name: name.to_string() });
        tracing::info!(node = name, "node deleted");
        Ok(())
    }

    pub fn update_node(&self, name: &str, new_name: &str) -> Result<(), GatewayError> {
        self.nodes.update_name(name, new_name)?;
        if let Some(driver) = self.drivers.write().remove(name) {
            self.drivers.write().insert(new_name.to_string(), driver);
            self.subscriptions.update_driver_name(name, new_name);
        }
        if let Some(app) = self.apps.write().remove(name) {
            self.apps.write().insert(new_name.to_string(), app);
            self.subscriptions.update_app_name(name, new_name);
        }
        self.append(GatewayEvent::RenameNode { name: name.to_string(), new_name: new_name.to_string() });
        Ok(())
    }

    pub fn node_setting(&self, name: &str, setting: serde_json::Value) -> Result<(), GatewayError> {
        self.nodes.find(name).ok_or(GatewayError::NodeNotExist)?;
        if let Some(driver) = self.drivers.read().get(name).cloned() {
            driver.apply_setting(setting.clone())?;
        } else if let Some(app) = self.apps.read().get(name).cloned() {
            app.apply_setting(setting.clone())?;
        }
        self.append(GatewayEvent::SetSetting { name: name.to_string(), setting });
        Ok(())
    }

    /// `NodeCtl`: arms or disarms every group's poll timer for a driver
    /// node, per the plugin's `TimerType` (spec §4.4).
    pub fn node_ctl(&self, name: &str, start: bool) -> Result<(), GatewayError> {
        self.nodes.find(name).ok_or(GatewayError::NodeNotExist)?;
        let driver = self.drivers.read().get(name).cloned();
        let Some(driver) = driver else {
            self.nodes.set_state(name, if start { AdapterState::Running } else { AdapterState::Stopped })?;
            return Ok(());
        };

        if start {
            for group in driver.group_names() {
                let key = (name.to_string(), group.clone());
                if self.timers.read().contains_key(&key) {
                    continue;
                }
                let interval_ms = driver.group(&group).map(|g| g.interval_ms()).unwrap_or(1000);
                let timer_type = driver.timer_type();
                let driver = driver.clone();
                let group_for_closure = group.clone();
                let metrics = self.metrics.clone();
                let metric_name = poll_errors_metric(name);
                let id = self
                    .reactor
                    .add_timer(interval_ms, timer_type, move || {
                        let driver = driver.clone();
                        let group = group_for_closure.clone();
                        let metrics = metrics.clone();
                        let metric_name = metric_name.clone();
                        async move {
                            if let Err(err) = driver.poll_group(&group).await {
                                metrics.incr_rolling(&metric_name, 1);
                                tracing::warn!(driver = driver.name(), group, error = %err, "poll_group failed");
                            }
                        }
                    })
                    .map_err(|_| GatewayError::EInternal)?;
                self.timers.write().insert(key, id);
            }
        } else {
            let mut timers = self.timers.write();
            let keys: Vec<_> = timers.keys().filter(|(driver, _)| driver == name).cloned().collect();
            for key in keys {
                if let Some(id) = timers.remove(&key) {
                    self.reactor.del_timer(id);
                }
            }
        }

        self.nodes.set_state(name, if start { AdapterState::Running } else { AdapterState::Stopped })
    }

    pub fn add_group(&self, driver: &str, group: &str, interval_ms: u32) -> Result<(), GatewayError> {
        let handle = self.drivers.read().get(driver).cloned().ok_or(GatewayError::NodeNotExist)?;
        handle.add_group(group, interval_ms)?;
        self.append(GatewayEvent::AddGroup { driver: driver.to_string(), group: group.to_string(), interval_ms });
        Ok(())
    }

    pub fn del_group(&self, driver: &str, group: &str) -> Result<(), GatewayError> {
        let handle = self.drivers.read().get(driver).cloned().ok_or(GatewayError::NodeNotExist)?;
        handle.del_group(group)?;
        self.append(GatewayEvent::DelGroup { driver: driver.to_string(), group: group.to_string() });
        Ok(())
    }

    pub fn update_group(&self, driver: &str, group: &str, interval_ms: u32) -> Result<(), GatewayError> {
        let handle = self.drivers.read().get(driver).cloned().ok_or(GatewayError::NodeNotExist)?;
        let group_handle = handle.group(group).ok_or(GatewayError::GroupNotExist)?;
        group_handle.set_interval(interval_ms);
        self.append(GatewayEvent::UpdateGroup { driver: driver.to_string(), group: group.to_string(), interval_ms });
        Ok(())
    }

    pub fn add_gtag(&self, driver: &str, group: &str, interval_ms: u32, tags: Vec<TagSpec>) -> Result<(), GatewayError> {
        let handle = self.drivers.read().get(driver).cloned().ok_or(GatewayError::NodeNotExist)?;
        if handle.group(group).is_none() {
            handle.add_group(group, interval_ms)?;
        }
        let built: Result<Vec<Tag>, _> =
            tags.iter().map(|t| Tag::new(&t.name, &t.address, t.r#type, t.attribute)).collect();
        let built = built.map_err(|_| GatewayError::GroupParameterInvalid)?;
        handle.add_gtag(group, built)?;
        for tag in &tags {
            self.append(GatewayEvent::AddTag {
                driver: driver.to_string(),
                group: group.to_string(),
                tag: TagDelta { name: tag.name.clone(), address: tag.address.clone(), r#type: tag.r#type, attribute: tag.attribute },
            });
        }
        Ok(())
    }

    /// `SUBSCRIBE_GROUP` (spec §4.8): app and driver must exist, the driver
    /// must have the group, and an MQTT app's `params.topic` must be
    /// non-empty. `SubscriptionManager::sub` is idempotent on (driver,
    /// group, app), so resubscribing the same tuple just refreshes params
    /// and the route instead of creating a second subscription.
    pub fn subscribe_group(&self, app: &str, driver: &str, group: &str, params: SubscribeParams) -> Result<(), GatewayError> {
        let app_entry = self.nodes.find(app).ok_or(GatewayError::NodeNotExist)?;
        self.nodes.find(driver).ok_or(GatewayError::NodeNotExist)?;
        let driver_handle = self.drivers.read().get(driver).cloned().ok_or(GatewayError::NodeNotExist)?;
        driver_handle.group(group).ok_or(GatewayError::GroupNotExist)?;

        if app_entry.plugin == "mqtt" && params.topic.as_deref().unwrap_or("").is_empty() {
            return Err(GatewayError::MqttSubscribeFailure);
        }

        let id = self.subscriptions.sub(driver, group, app);
        self.subscriptions.update_params(id, params.clone())?;

        if let Some(app_handle) = self.apps.read().get(app).cloned() {
            let route =
                Route { topic: params.topic.clone().unwrap_or_default(), params: params.clone(), qos: 0, format: "values".to_string() };
            app_handle.insert_route(driver, group, route);
        }

        self.append(GatewayEvent::AddSubscription { app: app.to_string(), driver: driver.to_string(), group: group.to_string(), params });
        Ok(())
    }

    pub fn unsubscribe_group(&self, app: &str, driver: &str, group: &str) -> Result<(), GatewayError> {
        let sub = self
            .subscriptions
            .find_by_driver(driver)
            .into_iter()
            .find(|s| s.matches(driver, group, app))
            .ok_or(GatewayError::GroupNotSubscribe)?;
        self.subscriptions.unsub(sub.id);
        if let Some(app_handle) = self.apps.read().get(app).cloned() {
            app_handle.remove_route(driver, group);
        }
        self.append(GatewayEvent::DelSubscription { app: app.to_string(), driver: driver.to_string(), group: group.to_string() });
        Ok(())
    }

    pub fn update_subscribe_group(&self, app: &str, driver: &str, group: &str, params: SubscribeParams) -> Result<(), GatewayError> {
        let app_entry = self.nodes.find(app).ok_or(GatewayError::NodeNotExist)?;
        let sub = self
            .subscriptions
            .find_by_driver(driver)
            .into_iter()
            .find(|s| s.matches(driver, group, app))
            .ok_or(GatewayError::GroupNotSubscribe)?;

        if app_entry.plugin == "mqtt" && params.topic.as_deref().unwrap_or("").is_empty() {
            return Err(GatewayError::MqttSubscribeFailure);
        }

        self.subscriptions.update_params(sub.id, params.clone())?;
        if let Some(app_handle) = self.apps.read().get(app).cloned() {
            let route =
                Route { topic: params.topic.clone().unwrap_or_default(), params: params.clone(), qos: 0, format: "values".to_string() };
            app_handle.insert_route(driver, group, route);
        }
        self.append(GatewayEvent::UpdateSubscription { app: app.to_string(), driver: driver.to_string(), group: group.to_string(), params });
        Ok(())
    }

    pub async fn write_tag(&self, driver: &str, group: &str, tag: &str, value: serde_json::Value) -> Result<(), GatewayError> {
        let handle = self.drivers.read().get(driver).cloned().ok_or(GatewayError::NodeNotExist)?;
        handle.write_tag(group, tag, value).await
    }

    pub async fn write_tags(&self, driver: &str, group: &str, values: Vec<(String, serde_json::Value)>) -> Result<(), GatewayError> {
        let handle = self.drivers.read().get(driver).cloned().ok_or(GatewayError::NodeNotExist)?;
        handle.write_tags(group, &values).await
    }

    /// Downstream read/write path (spec §4.5): decodes a request the app
    /// plugin received off its upstream transport, executes it as the bus
    /// operation it names, and re-encodes the result. Returns
    /// `(response_topic, payload)` for the (out-of-scope) transport layer
    /// to actually publish.
    pub async fn handle_downstream_request(
        &self,
        app: &str,
        topic: &str,
        payload: serde_json::Value,
    ) -> Result<(String, serde_json::Value), GatewayError> {
        let handle = self.apps.read().get(app).cloned().ok_or(GatewayError::NodeNotExist)?;
        let request = handle.decode_downstream(topic, payload)?;
        let result = match &request.op {
            DownstreamOp::ReadGroup { driver, group } => match self.read_group(driver, group) {
                Ok(values) => DownstreamResult::Values(
                    values.into_iter().map(|v| TagSample { tag: v.tag, value: v.value, timestamp: 0 }).collect(),
                ),
                Err(err) => DownstreamResult::Error(err),
            },
            DownstreamOp::WriteTag { driver, group, tag, value } => {
                match self.write_tag(driver, group, tag, value.clone()).await {
                    Ok(()) => DownstreamResult::Ack,
                    Err(err) => DownstreamResult::Error(err),
                }
            }
            DownstreamOp::WriteTags { driver, group, values } => {
                match self.write_tags(driver, group, values.clone()).await {
                    Ok(()) => DownstreamResult::Ack,
                    Err(err) => DownstreamResult::Error(err),
                }
            }
        };
        handle.encode_downstream_response(&request, result)
    }

    pub fn read_group(&self, driver: &str, group: &str) -> Result<Vec<TagValue>, GatewayError> {
        let handle = self.drivers.read().get(driver).cloned().ok_or(GatewayError::NodeNotExist)?;
        let group_handle = handle.group(group).ok_or(GatewayError::GroupNotExist)?;
        Ok(group_handle
            .all_tags()
            .into_iter()
            .map(|tag| TagValue { tag: tag.name.clone(), value: tag.static_value.clone(), error: 0 })
            .collect())
    }

    pub fn get_node(&self) -> Response {
        let nodes = self
            .nodes
            .filter(|_| true)
            .into_iter()
            .map(|entry| NodeSummary { name: entry.name, plugin: entry.plugin, kind: entry.kind, state: entry.state })
            .collect();
        Response::Nodes { nodes }
    }

    pub fn get_group(&self, driver: &str) -> Result<Response, GatewayError> {
        let handle = self.drivers.read().get(driver).cloned().ok_or(GatewayError::NodeNotExist)?;
        let groups = handle
            .group_names()
            .into_iter()
            .filter_map(|name| handle.group(&name).map(|g| GroupSummary { name: g.name().to_string(), interval_ms: g.interval_ms(), tag_count: g.tag_count() }))
            .collect();
        Ok(Response::Groups { groups })
    }

    pub fn get_tag(&self, driver: &str, group: &str) -> Result<Response, GatewayError> {
        let handle = self.drivers.read().get(driver).cloned().ok_or(GatewayError::NodeNotExist)?;
        let group_handle = handle.group(group).ok_or(GatewayError::GroupNotExist)?;
        Ok(Response::Tags { tags: group_handle.all_tags() })
    }

    /// `find_by_driver` is the only index `SubscriptionManager` exposes, so
    /// this scans every driver node's subscriptions for ones owned by `app`.
    pub fn get_sub_group(&self, app: &str) -> Response {
        let mut subscriptions = Vec::new();
        for node in self.nodes.filter(|e| e.kind == AdapterType::Driver) {
            subscriptions.extend(self.subscriptions.find_by_driver(&node.name).into_iter().filter(|s| s.app_name == app));
        }
        Response::Subscriptions { subscriptions }
    }

    pub fn del_tag(&self, driver: &str, group: &str, tag: &str) -> Result<(), GatewayError> {
        let handle = self.drivers.read().get(driver).cloned().ok_or(GatewayError::NodeNotExist)?;
        let group_handle = handle.group(group).ok_or(GatewayError::GroupNotExist)?;
        group_handle.del_tag(tag).map_err(|_| GatewayError::TagNotExist)?;
        self.append(GatewayEvent::DelTag { driver: driver.to_string(), group: group.to_string(), tag: tag.to_string() });
        Ok(())
    }

    pub fn update_tag(&self, driver: &str, group: &str, spec: TagSpec) -> Result<(), GatewayError> {
        let handle = self.drivers.read().get(driver).cloned().ok_or(GatewayError::NodeNotExist)?;
        let group_handle = handle.group(group).ok_or(GatewayError::GroupNotExist)?;
        let tag = Tag::new(&spec.name, &spec.address, spec.r#type, spec.attribute).map_err(|_| GatewayError::GroupParameterInvalid)?;
        group_handle.update_tag(tag).map_err(|_| GatewayError::TagNotExist)?;
        self.append(GatewayEvent::UpdateTag {
            driver: driver.to_string(),
            group: group.to_string(),
            tag: TagDelta { name: spec.name, address: spec.address, r#type: spec.r#type, attribute: spec.attribute },
        });
        Ok(())
    }

    /// Atomic batch add (spec §4.8): either every driver in `specs` is
    /// added, or none are — partial failures roll back the ones already
    /// committed.
    pub async fn add_drivers(&self, specs: Vec<DriverSpec>) -> Result<(), GatewayError> {
        let _guard = self.write_lock.lock().await;
        let mut added = Vec::new();
        for spec in &specs {
            match self.add_node_locked(&spec.name, &spec.plugin, AdapterType::Driver).await {
                Ok(()) => added.push(spec.name.clone()),
                Err(err) => {
                    for name in added.into_iter().rev() {
                        self.nodes.del(&name).ok();
                        self.drivers.write().remove(&name);
                        self.bus.unregister(&name);
                        self.metrics.release_rolling(&poll_errors_metric(&name));
                    }
                    self.update_node_count_gauge();
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
