//! Loader state: immutable configuration plus the readiness status machine.
//!
//! Status moves `NotStarted → Loading → {Ready | Failed}` and nowhere else;
//! only [`LoaderState::reset`] leaves a settled status.

use gmaps_config::LoaderConfig;
use gmaps_core::{ConfigError, InvalidTransition, LoadError, LoadStatus, SdkHandle};
use tracing::debug;

#[derive(Debug)]
pub struct LoaderState {
    config: Option<LoaderConfig>,
    status: LoadStatus,
    error: Option<LoadError>,
    handle: Option<SdkHandle>,
}

impl Default for LoaderState {
    fn default() -> Self {
        Self::new()
    }
}

impl LoaderState {
    pub fn new() -> Self {
        Self {
            config: None,
            status: LoadStatus::NotStarted,
            error: None,
            handle: None,
        }
    }

    /// Set the credential key and requested libraries, with defaults for the rest.
    pub fn initialize<I, S>(&mut self, credential_key: impl Into<String>, libraries: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.config.is_some() {
            return Err(ConfigError::AlreadyInitialized);
        }
        let config = LoaderConfig::new(credential_key, libraries)?;
        self.initialize_with(config)
    }

    /// Install a fully built configuration. Only the first call succeeds.
    pub fn initialize_with(&mut self, config: LoaderConfig) -> Result<(), ConfigError> {
        if self.config.is_some() {
            return Err(ConfigError::AlreadyInitialized);
        }
        debug!(summary = ?config.summary(), "Loader state initialized");
        self.config = Some(config);
        Ok(())
    }

    pub fn config(&self) -> Option<&LoaderConfig> {
        self.config.as_ref()
    }

    pub fn status(&self) -> LoadStatus {
        self.status
    }

    /// Present iff the status is `Failed`.
    pub fn error(&self) -> Option<&LoadError> {
        self.error.as_ref()
    }

    /// Present iff the status is `Ready`.
    pub fn handle(&self) -> Option<&SdkHandle> {
        self.handle.as_ref()
    }

    /// The sole status mutation path.
    pub fn transition_to(&mut self, next: LoadStatus, error: Option<LoadError>) -> Result<(), InvalidTransition> {
        use LoadStatus::*;

        let reject = |reason| InvalidTransition {
            from: self.status,
            to: next,
            reason,
        };
        if !matches!((self.status, next), (NotStarted, Loading) | (Loading, Ready) | (Loading, Failed)) {
            return Err(reject("out of order"));
        }
        if next == Loading && self.config.is_none() {
            return Err(reject("state is not initialized"));
        }
        match (next, &error) {
            (Failed, None) => return Err(reject("a failure needs a cause")),
            (Loading | Ready, Some(_)) => return Err(reject("only a failure carries an error")),
            _ => {}
        }

        debug!(from = %self.status, to = %next, "Loader transition");
        self.status = next;
        self.error = error;
        Ok(())
    }

    pub fn mark_ready(&mut self, handle: SdkHandle) -> Result<(), InvalidTransition> {
        self.transition_to(LoadStatus::Ready, None)?;
        self.handle = Some(handle);
        Ok(())
    }

    pub fn mark_failed(&mut self, error: LoadError) -> Result<(), InvalidTransition> {
        self.transition_to(LoadStatus::Failed, Some(error))
    }

    /// Return a settled state to `NotStarted`, keeping the configuration.
    pub fn reset(&mut self) -> Result<(), InvalidTransition> {
        if self.status == LoadStatus::Loading {
            return Err(InvalidTransition {
                from: LoadStatus::Loading,
                to: LoadStatus::NotStarted,
                reason: "a load is in flight",
            });
        }
        self.status = LoadStatus::NotStarted;
        self.error = None;
        self.handle = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gmaps_core::{Library, SdkInfo};
    use std::collections::BTreeSet;

    fn initialized() -> LoaderState {
        let mut state = LoaderState::new();
        state.initialize("K1", ["places"]).unwrap();
        state
    }

    fn handle() -> SdkHandle {
        SdkHandle::new(SdkInfo {
            version: "3.55".into(),
            libraries: BTreeSet::new(),
            loaded_at: Utc::now(),
        })
    }

    #[test]
    fn second_initialize_fails_and_keeps_first_config() {
        let mut state = initialized();
        let err = state.initialize("K2", ["geometry"]).unwrap_err();
        assert_eq!(err, ConfigError::AlreadyInitialized);

        let config = state.config().unwrap();
        assert_eq!(config.credential.expose(), "K1");
        assert_eq!(config.libraries, BTreeSet::from([Library::Places]));
    }

    #[test]
    fn initialize_validates_inputs() {
        let mut state = LoaderState::new();
        assert_eq!(state.initialize("", ["places"]), Err(ConfigError::EmptyCredential));
        assert_eq!(
            state.initialize("K1", ["teleport"]),
            Err(ConfigError::UnknownLibrary("teleport".into()))
        );
        assert!(state.config().is_none());
        assert!(state.initialize("K1", Vec::<&str>::new()).is_ok());
    }

    #[test]
    fn happy_path_transitions() {
        let mut state = initialized();
        state.transition_to(LoadStatus::Loading, None).unwrap();
        state.mark_ready(handle()).unwrap();
        assert_eq!(state.status(), LoadStatus::Ready);
        assert!(state.handle().is_some());
        assert!(state.error().is_none());
    }

    #[test]
    fn settled_states_are_terminal() {
        let mut state = initialized();
        state.transition_to(LoadStatus::Loading, None).unwrap();
        state.mark_failed(LoadError::Network("dns".into())).unwrap();

        let err = state.transition_to(LoadStatus::Loading, None).unwrap_err();
        assert_eq!(err.from, LoadStatus::Failed);
        assert!(state.mark_ready(handle()).is_err());
        assert_eq!(state.error(), Some(&LoadError::Network("dns".into())));
    }

    #[test]
    fn skipping_loading_is_rejected() {
        let mut state = initialized();
        assert!(state.mark_ready(handle()).is_err());
        assert_eq!(state.status(), LoadStatus::NotStarted);
    }

    #[test]
    fn error_must_match_status() {
        let mut state = initialized();
        assert!(state
            .transition_to(LoadStatus::Loading, Some(LoadError::Abandoned))
            .is_err());
        state.transition_to(LoadStatus::Loading, None).unwrap();
        assert!(state.transition_to(LoadStatus::Failed, None).is_err());
    }

    #[test]
    fn uninitialized_state_cannot_start_loading() {
        let mut state = LoaderState::new();
        let err = state.transition_to(LoadStatus::Loading, None).unwrap_err();
        assert_eq!(err.reason, "state is not initialized");
    }

    #[test]
    fn reset_clears_outcome_but_not_while_loading() {
        let mut state = initialized();
        state.transition_to(LoadStatus::Loading, None).unwrap();
        assert!(state.reset().is_err());

        state.mark_failed(LoadError::Credential("denied".into())).unwrap();
        state.reset().unwrap();
        assert_eq!(state.status(), LoadStatus::NotStarted);
        assert!(state.error().is_none());
        assert!(state.config().is_some());
    }
}
