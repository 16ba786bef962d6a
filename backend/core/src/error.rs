use thiserror::Error;

use crate::types::LoadStatus;

/// Setup errors, surfaced synchronously at install time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("loader state is already initialized")]
    AlreadyInitialized,

    #[error("loader state has not been initialized")]
    NotInitialized,

    #[error("credential key must not be empty")]
    EmptyCredential,

    #[error("unknown library token '{0}'")]
    UnknownLibrary(String),

    #[error("invalid SDK endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("invalid option at '{path}': {message}")]
    Invalid { path: String, message: String },
}

/// Failure of an SDK load attempt.
///
/// Every waiter of a settled load receives a clone of the same value, so the
/// payloads are plain strings rather than source errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("network error while fetching SDK script: {0}")]
    Network(String),

    #[error("SDK rejected the credential: {0}")]
    Credential(String),

    #[error("SDK did not signal readiness: {0}")]
    SdkInit(String),

    #[error("script injector invoked more than once for the same load")]
    DuplicateLoad,

    #[error("in-flight load was abandoned before settling")]
    Abandoned,

    #[error("internal loader error: {0}")]
    Internal(String),
}

impl LoadError {
    /// Transient failures are the only ones a retry policy may re-attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, LoadError::Network(_))
    }
}

/// A status change that violates `NotStarted → Loading → {Ready | Failed}`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid loader transition {from:?} -> {to:?}: {reason}")]
pub struct InvalidTransition {
    pub from: LoadStatus,
    pub to: LoadStatus,
    pub reason: &'static str,
}

impl From<InvalidTransition> for LoadError {
    fn from(err: InvalidTransition) -> Self {
        LoadError::Internal(err.to_string())
    }
}

/// Collisions in the host's component namespace or injection context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("component '{0}' is already registered")]
    DuplicateRegistration(String),

    #[error("context key '{0}' is already provided")]
    DuplicateContext(String),

    #[error("no component named '{0}'")]
    UnknownComponent(String),
}

/// Top-level error type for the gmaps plugin.
#[derive(Debug, Error)]
pub enum GMapsError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Transition(#[from] InvalidTransition),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("invalid props for {component}: {reason}")]
    InvalidProps { component: String, reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_errors_are_transient() {
        assert!(LoadError::Network("timeout".into()).is_transient());
        assert!(!LoadError::Credential("denied".into()).is_transient());
        assert!(!LoadError::SdkInit("timeout".into()).is_transient());
        assert!(!LoadError::DuplicateLoad.is_transient());
    }

    #[test]
    fn transition_error_becomes_internal_load_error() {
        let err = InvalidTransition {
            from: LoadStatus::Ready,
            to: LoadStatus::Loading,
            reason: "terminal",
        };
        match LoadError::from(err) {
            LoadError::Internal(msg) => assert!(msg.contains("Ready")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
