//! Component registry: exposes the map building blocks to the host.
//!
//! Names are checked before anything is inserted, so a rejected
//! registration leaves the namespace untouched.

use std::collections::BTreeMap;

use gmaps_config::DuplicatePolicy;
use gmaps_core::{GMapsError, RegistryError};
use serde_json::Value;
use tracing::{debug, warn};

use crate::broker::ReadinessBroker;
use crate::components::{
    GMapCircleProps, GMapInfoWindowProps, GMapMarkerProps, GMapProps, MapComponent, construct,
};
use crate::context::{CONTEXT_KEY, InjectionContext, MapsContext};

pub type ComponentConstructor = fn(Value) -> Result<Box<dyn MapComponent>, GMapsError>;

/// The host framework's component namespace.
#[derive(Default)]
pub struct ComponentNamespace {
    entries: BTreeMap<String, ComponentConstructor>,
}

impl ComponentNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Define a single name, as any other library in the host would.
    pub fn define(&mut self, name: &str, constructor: ComponentConstructor) -> Result<(), RegistryError> {
        if self.contains(name) {
            return Err(RegistryError::DuplicateRegistration(name.to_string()));
        }
        self.entries.insert(name.to_string(), constructor);
        Ok(())
    }

    /// Create a component instance the way the host does when it meets the tag.
    pub fn instantiate(&self, name: &str, props: Value) -> Result<Box<dyn MapComponent>, GMapsError> {
        let constructor = self
            .entries
            .get(name)
            .ok_or_else(|| RegistryError::UnknownComponent(name.to_string()))?;
        constructor(props)
    }
}

pub struct ComponentRegistry {
    components: Vec<(&'static str, ComponentConstructor)>,
    policy: DuplicatePolicy,
}

impl ComponentRegistry {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            components: vec![
                ("GMap", construct::<GMapProps> as ComponentConstructor),
                ("GMapMarker", construct::<GMapMarkerProps> as ComponentConstructor),
                ("GMapCircle", construct::<GMapCircleProps> as ComponentConstructor),
                ("GMapInfoWindow", construct::<GMapInfoWindowProps> as ComponentConstructor),
            ],
            policy,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.components.iter().map(|(name, _)| *name)
    }

    /// Map every component name to its constructor in the host namespace.
    pub fn register(&self, namespace: &mut ComponentNamespace) -> Result<(), RegistryError> {
        if self.policy == DuplicatePolicy::Reject {
            if let Some(taken) = self.names().find(|name| namespace.contains(name)) {
                return Err(RegistryError::DuplicateRegistration(taken.to_string()));
            }
        }
        for (name, constructor) in &self.components {
            if namespace.entries.insert(name.to_string(), *constructor).is_some() {
                warn!(component = *name, "Overwrote existing component registration");
            } else {
                debug!(component = *name, "Registered component");
            }
        }
        Ok(())
    }

    /// Publish the read-only maps context under [`CONTEXT_KEY`].
    pub fn expose_context(&self, context: &mut InjectionContext, broker: &ReadinessBroker) -> Result<(), RegistryError> {
        context.provide(CONTEXT_KEY, MapsContext::new(broker.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dummy(_: Value) -> Result<Box<dyn MapComponent>, GMapsError> {
        Err(GMapsError::InvalidProps {
            component: "Dummy".into(),
            reason: "placeholder".into(),
        })
    }

    #[test]
    fn registers_the_four_components() {
        let mut ns = ComponentNamespace::new();
        ComponentRegistry::new(DuplicatePolicy::Reject).register(&mut ns).unwrap();
        assert_eq!(ns.names(), vec!["GMap", "GMapCircle", "GMapInfoWindow", "GMapMarker"]);

        let marker = ns
            .instantiate("GMapMarker", json!({"position": {"lat": 1.0, "lng": 2.0}}))
            .unwrap();
        assert_eq!(marker.name(), "GMapMarker");
    }

    #[test]
    fn collision_is_rejected_without_partial_registration() {
        let mut ns = ComponentNamespace::new();
        ns.define("GMapCircle", dummy).unwrap();

        let err = ComponentRegistry::new(DuplicatePolicy::Reject).register(&mut ns).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateRegistration("GMapCircle".into()));
        assert_eq!(ns.names(), vec!["GMapCircle"]);
    }

    #[test]
    fn overwrite_policy_replaces_existing_names() {
        let mut ns = ComponentNamespace::new();
        ns.define("GMap", dummy).unwrap();

        ComponentRegistry::new(DuplicatePolicy::Overwrite).register(&mut ns).unwrap();
        let map = ns.instantiate("GMap", json!({"center": {"lat": 0.0, "lng": 0.0}})).unwrap();
        assert_eq!(map.name(), "GMap");
    }

    #[test]
    fn unknown_component_is_an_error() {
        let ns = ComponentNamespace::new();
        assert!(matches!(
            ns.instantiate("GMapPolygon", json!({})),
            Err(GMapsError::Registry(RegistryError::UnknownComponent(_)))
        ));
    }
}
