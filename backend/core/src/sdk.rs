use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::types::Library;

/// What the SDK reported about itself once it finished initialising.
#[derive(Debug, Clone, Serialize)]
pub struct SdkInfo {
    pub version: String,
    pub libraries: BTreeSet<Library>,
    pub loaded_at: DateTime<Utc>,
}

/// Read-only handle to a loaded SDK.
///
/// Cloning is cheap; all clones of one load share the same allocation and
/// compare equal, handles from different loads never do.
#[derive(Debug, Clone)]
pub struct SdkHandle(Arc<SdkInfo>);

impl SdkHandle {
    pub fn new(info: SdkInfo) -> Self {
        Self(Arc::new(info))
    }

    pub fn info(&self) -> &SdkInfo {
        &self.0
    }

    pub fn version(&self) -> &str {
        &self.0.version
    }

    pub fn has_library(&self, library: Library) -> bool {
        self.0.libraries.contains(&library)
    }
}

impl PartialEq for SdkHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for SdkHandle {}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> SdkInfo {
        SdkInfo {
            version: "3.55".into(),
            libraries: BTreeSet::from([Library::Places]),
            loaded_at: Utc::now(),
        }
    }

    #[test]
    fn clones_share_identity() {
        let handle = SdkHandle::new(info());
        assert_eq!(handle, handle.clone());
        assert_ne!(handle, SdkHandle::new(info()));
        assert!(handle.has_library(Library::Places));
        assert!(!handle.has_library(Library::Drawing));
    }
}
