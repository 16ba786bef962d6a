//! One-time plugin installation into a host application.

use std::sync::Arc;

use gmaps_config::LoaderConfig;
use gmaps_core::{GMapsError, RegistryError};
use tracing::info;

use crate::broker::ReadinessBroker;
use crate::context::{CONTEXT_KEY, InjectionContext};
use crate::http_env::HttpEnvironment;
use crate::injector::{RemoteScriptInjector, ScriptInjector};
use crate::registry::{ComponentNamespace, ComponentRegistry};
use crate::state::LoaderState;

/// The parts of a host framework the plugin touches.
#[derive(Default)]
pub struct HostApp {
    pub components: ComponentNamespace,
    pub context: InjectionContext,
}

impl HostApp {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct GMapsPlugin;

impl GMapsPlugin {
    /// Install against the real provider over HTTP. `ready_timeout` bounds
    /// each load end to end.
    pub fn install(host: &mut HostApp, config: LoaderConfig) -> Result<ReadinessBroker, GMapsError> {
        let env = HttpEnvironment::new(config.ready_timeout)?;
        let injector = Arc::new(RemoteScriptInjector::new(env, config.ready_timeout));
        Self::install_with(host, config, injector)
    }

    /// Install with a caller-supplied injector.
    ///
    /// Registers the components, publishes the maps context, and returns the
    /// owning broker handle (the only one that can `reset`). Nothing is
    /// changed in the host if any step fails.
    pub fn install_with(
        host: &mut HostApp,
        config: LoaderConfig,
        injector: Arc<dyn ScriptInjector>,
    ) -> Result<ReadinessBroker, GMapsError> {
        if host.context.contains(CONTEXT_KEY) {
            return Err(RegistryError::DuplicateContext(CONTEXT_KEY.to_string()).into());
        }

        let policy = config.on_duplicate;
        let summary = config.summary();
        let mut state = LoaderState::new();
        state.initialize_with(config)?;
        let broker = ReadinessBroker::new(state, injector)?;

        let registry = ComponentRegistry::new(policy);
        registry.register(&mut host.components)?;
        registry.expose_context(&mut host.context, &broker)?;

        info!(
            libraries = ?summary.libraries,
            credential = %summary.credential_hint,
            "Maps plugin installed"
        );
        Ok(broker)
    }
}
