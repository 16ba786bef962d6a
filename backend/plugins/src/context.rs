//! Host injection context and the value this plugin publishes into it.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use gmaps_config::ConfigSummary;
use gmaps_core::{LoadError, LoadStatus, RegistryError, SdkHandle};

use crate::broker::ReadinessBroker;

/// Name under which the maps context is provided.
pub const CONTEXT_KEY: &str = "GMaps";

/// Values shared across the host's component tree, looked up by name.
#[derive(Default)]
pub struct InjectionContext {
    values: HashMap<String, Arc<dyn Any + Send + Sync>>,
}

impl InjectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provide a value under `key`. Keys are never silently replaced.
    pub fn provide<T: Any + Send + Sync>(&mut self, key: &str, value: T) -> Result<(), RegistryError> {
        if self.values.contains_key(key) {
            return Err(RegistryError::DuplicateContext(key.to_string()));
        }
        self.values.insert(key.to_string(), Arc::new(value));
        Ok(())
    }

    /// Look up a value by key and type; a type mismatch reads as absent.
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.values.get(key).cloned()?.downcast::<T>().ok()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

/// What components see of the plugin: a capability to use the SDK, never the raw key.
#[derive(Debug, Clone)]
pub struct MapsContext {
    broker: ReadinessBroker,
}

impl MapsContext {
    pub fn new(broker: ReadinessBroker) -> Self {
        Self { broker }
    }

    pub async fn acquire(&self) -> Result<SdkHandle, LoadError> {
        self.broker.acquire().await
    }

    pub fn current_status(&self) -> LoadStatus {
        self.broker.current_status()
    }

    pub fn summary(&self) -> &ConfigSummary {
        self.broker.summary()
    }
}
