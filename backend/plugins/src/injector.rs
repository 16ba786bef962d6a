//! Script injection: the one physical acquisition of the SDK.
//!
//! [`ScriptInjector`] is the seam the broker drives. [`RemoteScriptInjector`]
//! is the real implementation; it delegates fetching and evaluating the
//! script to a [`ScriptEnvironment`] and then waits for the SDK to report
//! back through a [`ReadySignal`]. Fetch and readiness share one deadline.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use gmaps_core::{LoadError, SdkHandle, SdkInfo};
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, error, info};
use url::Url;

use crate::request::ScriptRequest;

/// Performs one SDK load for a request.
#[async_trait]
pub trait ScriptInjector: Send + Sync {
    /// Fetch, inject and await readiness. A second call without [`reset`]
    /// fails with [`LoadError::DuplicateLoad`].
    ///
    /// [`reset`]: ScriptInjector::reset
    async fn load(&self, request: &ScriptRequest) -> Result<SdkHandle, LoadError>;

    /// Forget a settled attempt so the next `load` counts as fresh.
    fn reset(&self) {}
}

/// What the SDK reports about its own initialisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SdkReport {
    Ready { version: String },
    AuthFailure(String),
}

/// One-shot channel the environment uses to relay the SDK's report.
///
/// Dropping it without reporting counts as an initialisation failure.
#[derive(Debug)]
pub struct ReadySignal {
    tx: oneshot::Sender<SdkReport>,
}

impl ReadySignal {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<SdkReport>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    pub fn ready(self, version: impl Into<String>) {
        let _ = self.tx.send(SdkReport::Ready {
            version: version.into(),
        });
    }

    pub fn auth_failure(self, reason: impl Into<String>) {
        let _ = self.tx.send(SdkReport::AuthFailure(reason.into()));
    }
}

/// The execution environment the script is injected into.
#[async_trait]
pub trait ScriptEnvironment: Send + Sync {
    /// Retrieve the script body. Transport failures are [`LoadError::Network`].
    async fn fetch(&self, url: &Url) -> Result<String, LoadError>;

    /// Hand the script over for evaluation. The SDK reports back through `signal`,
    /// possibly after this call has returned.
    fn execute(&self, request: &ScriptRequest, script: String, signal: ReadySignal) -> Result<(), LoadError>;
}

/// Injector over a [`ScriptEnvironment`]; `ready_timeout` bounds the whole
/// load, fetch included.
pub struct RemoteScriptInjector<E> {
    env: E,
    ready_timeout: Duration,
    claimed: AtomicBool,
}

impl<E: ScriptEnvironment> RemoteScriptInjector<E> {
    pub fn new(env: E, ready_timeout: Duration) -> Self {
        Self {
            env,
            ready_timeout,
            claimed: AtomicBool::new(false),
        }
    }

    pub fn environment(&self) -> &E {
        &self.env
    }
}

#[async_trait]
impl<E: ScriptEnvironment> ScriptInjector for RemoteScriptInjector<E> {
    async fn load(&self, request: &ScriptRequest) -> Result<SdkHandle, LoadError> {
        if self.claimed.swap(true, Ordering::AcqRel) {
            error!(url = %request.redacted_url(), "Script injector invoked twice");
            return Err(LoadError::DuplicateLoad);
        }

        let deadline = Instant::now() + self.ready_timeout;
        debug!(url = %request.redacted_url(), "Fetching SDK script");
        let script = match tokio::time::timeout_at(deadline, self.env.fetch(&request.url())).await {
            Ok(fetched) => fetched?,
            Err(_) => {
                return Err(LoadError::Network(format!(
                    "script fetch did not complete within {}ms",
                    self.ready_timeout.as_millis()
                )));
            }
        };

        let (signal, ready) = ReadySignal::channel();
        self.env.execute(request, script, signal)?;

        match tokio::time::timeout_at(deadline, ready).await {
            Err(_) => Err(LoadError::SdkInit(format!(
                "no readiness signal within {}ms",
                self.ready_timeout.as_millis()
            ))),
            Ok(Err(_)) => Err(LoadError::SdkInit("readiness signal dropped".into())),
            Ok(Ok(SdkReport::AuthFailure(reason))) => Err(LoadError::Credential(reason)),
            Ok(Ok(SdkReport::Ready { version })) => {
                info!(%version, libraries = %request.libraries_param(), "SDK reported ready");
                Ok(SdkHandle::new(SdkInfo {
                    version,
                    libraries: request.libraries.clone(),
                    loaded_at: Utc::now(),
                }))
            }
        }
    }

    fn reset(&self) {
        self.claimed.store(false, Ordering::Release);
    }
}
