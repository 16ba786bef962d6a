//! Map building blocks registered into the host's component namespace.
//!
//! Rendering is the host's business. A component here validates its props,
//! and when mounted consults the broker so it can tell the host whether the
//! SDK is usable or the component should show an "unavailable" state.

use std::fmt::Debug;

use async_trait::async_trait;
use gmaps_core::{GMapsError, LoadError, SdkHandle};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::context::MapsContext;

/// Where a mounted component stands with respect to the SDK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentState {
    Created,
    Ready(SdkHandle),
    Unavailable(LoadError),
}

/// A component instance created by the host from registered constructors.
#[async_trait]
pub trait MapComponent: Send + Sync + Debug {
    fn name(&self) -> &'static str;

    fn state(&self) -> &ComponentState;

    /// Props as validated at construction.
    fn props(&self) -> Value;

    /// Lifecycle hook: wait for the SDK and record whether it can be used.
    async fn mounted(&mut self, maps: &MapsContext) -> ComponentState;
}

/// Props of one component kind.
pub trait ComponentProps: DeserializeOwned + Serialize + Debug + Send + Sync + 'static {
    const NAME: &'static str;

    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    fn validate(&self, field: &str) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(format!("{field}.lat {} is outside [-90, 90]", self.lat));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(format!("{field}.lng {} is outside [-180, 180]", self.lng));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GMapProps {
    pub center: LatLng,
    #[serde(default = "default_zoom")]
    pub zoom: u8,
}

fn default_zoom() -> u8 {
    12
}

impl ComponentProps for GMapProps {
    const NAME: &'static str = "GMap";

    fn validate(&self) -> Result<(), String> {
        self.center.validate("center")?;
        if self.zoom > 22 {
            return Err(format!("zoom {} is above 22", self.zoom));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GMapMarkerProps {
    pub position: LatLng,
    #[serde(default)]
    pub title: Option<String>,
}

impl ComponentProps for GMapMarkerProps {
    const NAME: &'static str = "GMapMarker";

    fn validate(&self) -> Result<(), String> {
        self.position.validate("position")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GMapCircleProps {
    pub center: LatLng,
    /// Metres.
    pub radius: f64,
}

impl ComponentProps for GMapCircleProps {
    const NAME: &'static str = "GMapCircle";

    fn validate(&self) -> Result<(), String> {
        self.center.validate("center")?;
        if !self.radius.is_finite() || self.radius <= 0.0 {
            return Err(format!("radius {} must be a positive number", self.radius));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GMapInfoWindowProps {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub position: Option<LatLng>,
}

impl ComponentProps for GMapInfoWindowProps {
    const NAME: &'static str = "GMapInfoWindow";

    fn validate(&self) -> Result<(), String> {
        match &self.position {
            Some(position) => position.validate("position"),
            None => Ok(()),
        }
    }
}

/// Generic component body shared by every kind.
#[derive(Debug)]
pub struct MapElement<P> {
    props: P,
    state: ComponentState,
}

pub type GMap = MapElement<GMapProps>;
pub type GMapMarker = MapElement<GMapMarkerProps>;
pub type GMapCircle = MapElement<GMapCircleProps>;
pub type GMapInfoWindow = MapElement<GMapInfoWindowProps>;

impl<P: ComponentProps> MapElement<P> {
    pub fn from_props(props: Value) -> Result<Self, GMapsError> {
        let invalid = |reason: String| GMapsError::InvalidProps {
            component: P::NAME.to_string(),
            reason,
        };
        let props: P = serde_json::from_value(props).map_err(|e| invalid(e.to_string()))?;
        props.validate().map_err(invalid)?;
        Ok(Self {
            props,
            state: ComponentState::Created,
        })
    }

    pub fn typed_props(&self) -> &P {
        &self.props
    }
}

#[async_trait]
impl<P: ComponentProps> MapComponent for MapElement<P> {
    fn name(&self) -> &'static str {
        P::NAME
    }

    fn state(&self) -> &ComponentState {
        &self.state
    }

    fn props(&self) -> Value {
        serde_json::to_value(&self.props).unwrap_or(Value::Null)
    }

    async fn mounted(&mut self, maps: &MapsContext) -> ComponentState {
        self.state = match maps.acquire().await {
            Ok(handle) => {
                debug!(component = P::NAME, version = handle.version(), "Component ready");
                ComponentState::Ready(handle)
            }
            Err(err) => {
                warn!(component = P::NAME, error = %err, "SDK unavailable; component degraded");
                ComponentState::Unavailable(err)
            }
        };
        self.state.clone()
    }
}

/// Build a boxed component of kind `P` from untyped host props.
pub fn construct<P: ComponentProps>(props: Value) -> Result<Box<dyn MapComponent>, GMapsError> {
    Ok(Box::new(MapElement::<P>::from_props(props)?))
}
