use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Optional SDK feature modules that may be requested at load time.
///
/// Variants are declared in token order so that `Ord` matches the
/// lexicographic order of their wire names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Library {
    Drawing,
    Geometry,
    JourneySharing,
    LocalContext,
    Marker,
    Places,
    Visualization,
}

impl Library {
    pub const ALL: [Library; 7] = [
        Library::Drawing,
        Library::Geometry,
        Library::JourneySharing,
        Library::LocalContext,
        Library::Marker,
        Library::Places,
        Library::Visualization,
    ];

    /// Token as it appears in the `libraries` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Library::Drawing => "drawing",
            Library::Geometry => "geometry",
            Library::JourneySharing => "journeySharing",
            Library::LocalContext => "localContext",
            Library::Marker => "marker",
            Library::Places => "places",
            Library::Visualization => "visualization",
        }
    }
}

impl FromStr for Library {
    type Err = ConfigError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();
        Library::ALL
            .into_iter()
            .find(|lib| lib.as_str() == token)
            .ok_or_else(|| ConfigError::UnknownLibrary(token.to_string()))
    }
}

impl fmt::Display for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Readiness of the SDK for one installed plugin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    NotStarted,
    Loading,
    Ready,
    Failed,
}

impl LoadStatus {
    pub fn is_settled(self) -> bool {
        matches!(self, LoadStatus::Ready | LoadStatus::Failed)
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoadStatus::NotStarted => "not-started",
            LoadStatus::Loading => "loading",
            LoadStatus::Ready => "ready",
            LoadStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Mask a secret string, keeping a four-character hint when it is long enough.
pub fn mask_secret(s: &str) -> String {
    if s.chars().count() > 4 {
        format!("{}***", s.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    }
}

/// API credential for the SDK provider.
///
/// `Debug` and `Display` only ever show a masked hint; the raw key is
/// reachable through [`Credential::expose`] when building the request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(ConfigError::EmptyCredential);
        }
        Ok(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First four characters followed by `***`.
    pub fn hint(&self) -> String {
        mask_secret(&self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.hint()).finish()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hint())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_order_matches_token_order() {
        let mut tokens: Vec<&str> = Library::ALL.iter().map(|l| l.as_str()).collect();
        let declared = tokens.clone();
        tokens.sort_unstable();
        assert_eq!(tokens, declared);
    }

    #[test]
    fn parses_known_tokens_and_rejects_unknown() {
        assert_eq!("places".parse::<Library>().unwrap(), Library::Places);
        assert_eq!(" geometry ".parse::<Library>().unwrap(), Library::Geometry);
        assert_eq!(
            "streetview".parse::<Library>(),
            Err(ConfigError::UnknownLibrary("streetview".into()))
        );
    }

    #[test]
    fn credential_is_masked_in_debug_output() {
        let key = Credential::new("AIzaSyExampleKey").unwrap();
        let debug = format!("{key:?}");
        assert!(!debug.contains("SyExampleKey"));
        assert_eq!(key.to_string(), "AIza***");
        assert_eq!(key.expose(), "AIzaSyExampleKey");
    }

    #[test]
    fn only_ready_and_failed_are_settled() {
        assert!(!LoadStatus::NotStarted.is_settled());
        assert!(!LoadStatus::Loading.is_settled());
        assert!(LoadStatus::Ready.is_settled());
        assert!(LoadStatus::Failed.is_settled());
    }

    #[test]
    fn empty_credential_is_rejected() {
        assert_eq!(Credential::new("   "), Err(ConfigError::EmptyCredential));
    }
}
