// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static plugin registry (DESIGN NOTES §9): a single binary links every
//! plugin it ships, so there is no `dlopen`/`LIBRARY_NOT_FOUND` path —
//! `AddNode` looks a module name up here and fails `LibraryNotFound` if
//! it isn't registered.

use std::collections::HashMap;
use std::sync::Arc;

use gw_core::GatewayError;
use parking_lot::RwLock;

use crate::app::AppPlugin;
use crate::driver::DriverPlugin;

#[derive(Clone)]
pub enum PluginFactory {
    Driver(Arc<dyn Fn() -> Arc<dyn DriverPlugin> + Send + Sync>),
    App(Arc<dyn Fn() -> Arc<dyn AppPlugin> + Send + Sync>),
}

/// Registered plugin modules, keyed by `module_name`. Built once at daemon
/// startup and treated as read-mostly thereafter.
#[derive(Default)]
pub struct PluginRegistry {
    factories: RwLock<HashMap<String, PluginFactory>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_driver<F>(&self, module_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn DriverPlugin> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .insert(module_name.into(), PluginFactory::Driver(Arc::new(factory)));
    }

    pub fn register_app<F>(&self, module_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn AppPlugin> + Send + Sync + 'static,
    {
        self.factories
            .write()
            .insert(module_name.into(), PluginFactory::App(Arc::new(factory)));
    }

    pub fn instantiate_driver(&self, module_name: &str) -> Result<Arc<dyn DriverPlugin>, GatewayError> {
        match self.factories.read().get(module_name) {
            Some(PluginFactory::Driver(factory)) => Ok(factory()),
            Some(PluginFactory::App(_)) => Err(GatewayError::LibraryNotAllow),
            None => Err(GatewayError::LibraryNotFound),
        }
    }

    pub fn instantiate_app(&self, module_name: &str) -> Result<Arc<dyn AppPlugin>, GatewayError> {
        match self.factories.read().get(module_name) {
            Some(PluginFactory::App(factory)) => Ok(factory()),
            Some(PluginFactory::Driver(_)) => Err(GatewayError::LibraryNotAllow),
            None => Err(GatewayError::LibraryNotFound),
        }
    }

    pub fn module_names(&self) -> Vec<String> {
        self.factories.read().keys().cloned().collect()
    }

    /// Registers the reference plugins shipped in this crate.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_driver("modbus_tcp", || Arc::new(crate::modbus::ModbusDriver::new()));
        registry.register_app("mqtt", || Arc::new(crate::mqtt::MqttApp::new()));
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_module_is_library_not_found() {
        let registry = PluginRegistry::new();
        let err = registry.instantiate_driver("nope").unwrap_err();
        assert_eq!(err, GatewayError::LibraryNotFound);
    }

    #[test]
    fn wrong_kind_lookup_is_library_not_allow() {
        let registry = PluginRegistry::with_builtins();
        let err = registry.instantiate_app("modbus_tcp").unwrap_err();
        assert_eq!(err, GatewayError::LibraryNotAllow);
    }

    #[test]
    fn builtins_instantiate() {
        let registry = PluginRegistry::with_builtins();
        assert!(registry.instantiate_driver("modbus_tcp").is_ok());
        assert!(registry.instantiate_app("mqtt").is_ok());
        assert_eq!(registry.module_names().len(), 2);
    }
}
