//! Canonical SDK script request.

use std::collections::BTreeSet;

use gmaps_config::LoaderConfig;
use gmaps_core::{Credential, Library};
use url::Url;

/// Global callback name the SDK invokes once it has initialised.
pub const READY_CALLBACK: &str = "__gmapsReady";

/// Everything needed to fetch the SDK script once.
///
/// Query parameters are always emitted in the same order and libraries are
/// sorted by token, so equal configurations produce byte-identical URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptRequest {
    pub endpoint: Url,
    pub credential: Credential,
    pub libraries: BTreeSet<Library>,
    pub version: Option<String>,
    pub language: Option<String>,
    pub region: Option<String>,
    pub callback: String,
}

impl ScriptRequest {
    pub fn from_config(config: &LoaderConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            credential: config.credential.clone(),
            libraries: config.libraries.clone(),
            version: config.version.clone(),
            language: config.language.clone(),
            region: config.region.clone(),
            callback: READY_CALLBACK.to_string(),
        }
    }

    /// Comma-joined library tokens in sorted order.
    pub fn libraries_param(&self) -> String {
        self.libraries
            .iter()
            .map(|l| l.as_str())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The URL to fetch, carrying the raw key.
    pub fn url(&self) -> Url {
        self.build(self.credential.expose())
    }

    /// The URL with the key masked, for logs and diagnostics.
    pub fn redacted_url(&self) -> String {
        self.build(&self.credential.hint()).to_string()
    }

    fn build(&self, key: &str) -> Url {
        let mut url = self.endpoint.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("key", key);
            if !self.libraries.is_empty() {
                query.append_pair("libraries", &self.libraries_param());
            }
            if let Some(v) = &self.version {
                query.append_pair("v", v);
            }
            if let Some(language) = &self.language {
                query.append_pair("language", language);
            }
            if let Some(region) = &self.region {
                query.append_pair("region", region);
            }
            query.append_pair("callback", &self.callback);
        }
        url
    }
}
