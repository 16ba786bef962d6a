pub mod broker;
pub mod components;
pub mod context;
pub mod http_env;
pub mod injector;
pub mod plugin;
pub mod registry;
pub mod request;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use broker::ReadinessBroker;
pub use components::{ComponentState, GMap, GMapCircle, GMapInfoWindow, GMapMarker, MapComponent};
pub use context::{CONTEXT_KEY, InjectionContext, MapsContext};
pub use http_env::HttpEnvironment;
pub use injector::{ReadySignal, RemoteScriptInjector, ScriptEnvironment, ScriptInjector, SdkReport};
pub use plugin::{GMapsPlugin, HostApp};
pub use registry::{ComponentConstructor, ComponentNamespace, ComponentRegistry};
pub use request::{READY_CALLBACK, ScriptRequest};
pub use state::LoaderState;
