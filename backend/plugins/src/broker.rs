//! Readiness broker: the single entry point for obtaining the SDK.
//!
//! Concurrent `acquire()` calls are coalesced into one in-flight load. The
//! first caller to find the state `NotStarted` triggers the load on a spawned
//! task, so dropping any caller's future, the trigger's included, never
//! aborts the load for the others. Settlement records the outcome and
//! notifies every waiter inside one critical section. A load task that is
//! dropped unfinished still settles, as [`LoadError::Abandoned`].

use std::collections::VecDeque;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::FutureExt;
use gmaps_config::{ConfigSummary, RetryPolicy};
use gmaps_core::{ConfigError, InvalidTransition, LoadError, LoadStatus, SdkHandle};
use gmaps_logging::{EventLogger, LoaderEvent};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use crate::injector::ScriptInjector;
use crate::request::ScriptRequest;
use crate::state::LoaderState;

type Outcome = Result<SdkHandle, LoadError>;
type Waiter = oneshot::Sender<Outcome>;

/// Cheaply clonable handle; all clones share one loader.
#[derive(Clone)]
pub struct ReadinessBroker {
    shared: Arc<Shared>,
}

struct Shared {
    inner: Mutex<Inner>,
    injector: Arc<dyn ScriptInjector>,
    request: ScriptRequest,
    retry: RetryPolicy,
    summary: ConfigSummary,
    attempts: AtomicU32,
}

struct Inner {
    state: LoaderState,
    waiters: VecDeque<Waiter>,
}

enum Ticket {
    Settled(Outcome),
    Pending(oneshot::Receiver<Outcome>),
}

impl ReadinessBroker {
    /// Take ownership of an initialized state and the injector that will serve it.
    pub fn new(state: LoaderState, injector: Arc<dyn ScriptInjector>) -> Result<Self, ConfigError> {
        let config = state.config().ok_or(ConfigError::NotInitialized)?;
        let request = ScriptRequest::from_config(config);
        let retry = config.retry;
        let summary = config.summary();

        Ok(Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state,
                    waiters: VecDeque::new(),
                }),
                injector,
                request,
                retry,
                summary,
                attempts: AtomicU32::new(0),
            }),
        })
    }

    /// Obtain the SDK, loading it if nobody has yet.
    ///
    /// The triggering call spawns the load onto the current Tokio runtime.
    /// Without one it fails with [`LoadError::Internal`] and leaves the
    /// state `NotStarted`.
    pub async fn acquire(&self) -> Outcome {
        match self.register() {
            Ticket::Settled(outcome) => outcome,
            Ticket::Pending(rx) => rx.await.unwrap_or(Err(LoadError::Abandoned)),
        }
    }

    /// Non-blocking peek; never starts a load.
    pub fn current_status(&self) -> LoadStatus {
        self.shared.lock().state.status()
    }

    pub fn summary(&self) -> &ConfigSummary {
        &self.shared.summary
    }

    /// The canonical request this broker loads with.
    pub fn request(&self) -> &ScriptRequest {
        &self.shared.request
    }

    /// Number of times the injector has been invoked, retries included.
    pub fn load_attempts(&self) -> u32 {
        self.shared.attempts.load(Ordering::SeqCst)
    }

    /// Return a settled broker to `NotStarted` so the next `acquire()` loads again.
    ///
    /// Rejected while a load is in flight.
    pub fn reset(&self) -> Result<(), InvalidTransition> {
        let mut inner = self.shared.lock();
        let previous = inner.state.status();
        inner.state.reset()?;
        self.shared.injector.reset();
        EventLogger::log_event(LoaderEvent::Reset {
            previous: previous.to_string(),
        });
        info!(%previous, "SDK loader reset");
        Ok(())
    }

    fn register(&self) -> Ticket {
        let mut inner = self.shared.lock();
        match inner.state.status() {
            LoadStatus::Ready => Ticket::Settled(
                inner
                    .state
                    .handle()
                    .cloned()
                    .ok_or_else(|| LoadError::Internal("ready state without a handle".into())),
            ),
            LoadStatus::Failed => Ticket::Settled(Err(inner
                .state
                .error()
                .cloned()
                .unwrap_or_else(|| LoadError::Internal("failed state without an error".into())))),
            LoadStatus::Loading => {
                let (tx, rx) = oneshot::channel();
                inner.waiters.push_back(tx);
                debug!(waiters = inner.waiters.len(), "Joined in-flight SDK load");
                Ticket::Pending(rx)
            }
            LoadStatus::NotStarted => {
                let Ok(runtime) = Handle::try_current() else {
                    error!("SDK load requested outside a Tokio runtime");
                    return Ticket::Settled(Err(LoadError::Internal(
                        "acquire() called outside a Tokio runtime".into(),
                    )));
                };
                if let Err(violation) = inner.state.transition_to(LoadStatus::Loading, None) {
                    error!(%violation, "Could not start SDK load");
                    return Ticket::Settled(Err(violation.into()));
                }
                let (tx, rx) = oneshot::channel();
                inner.waiters.push_back(tx);
                drop(inner);

                runtime.spawn(LoadTask::new(Arc::clone(&self.shared)).run());
                Ticket::Pending(rx)
            }
        }
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn load_with_retry(&self) -> Outcome {
        let mut attempt = 1;
        loop {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            EventLogger::log_event(LoaderEvent::LoadStarted {
                attempt,
                url: self.request.redacted_url(),
            });

            match self.injector.load(&self.request).await {
                Ok(handle) => return Ok(handle),
                Err(err) if err.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        attempt,
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "Transient SDK load failure; retrying"
                    );
                    self.injector.reset();
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Record the outcome and wake every waiter, FIFO, without releasing the lock.
    fn settle(&self, outcome: Outcome) {
        let mut inner = self.lock();
        let recorded = match &outcome {
            Ok(handle) => inner.state.mark_ready(handle.clone()),
            Err(err) => inner.state.mark_failed(err.clone()),
        };
        let outcome = match recorded {
            Ok(()) => outcome,
            Err(violation) => {
                error!(%violation, "Loader state rejected settlement");
                Err(violation.into())
            }
        };

        let waiters = std::mem::take(&mut inner.waiters);
        EventLogger::log_event(LoaderEvent::LoadSettled {
            status: inner.state.status().to_string(),
            waiters: waiters.len(),
            error: outcome.as_ref().err().map(ToString::to_string),
        });
        for waiter in waiters {
            // A closed receiver is a caller that stopped waiting.
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// The spawned load. Dropped before finishing (runtime shut down, task
/// aborted), it settles the broker as [`LoadError::Abandoned`].
struct LoadTask {
    shared: Option<Arc<Shared>>,
}

impl LoadTask {
    fn new(shared: Arc<Shared>) -> Self {
        Self { shared: Some(shared) }
    }

    async fn run(mut self) {
        let Some(shared) = self.shared.clone() else {
            return;
        };
        let outcome = AssertUnwindSafe(shared.load_with_retry())
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(LoadError::Internal("script injector panicked".into())));
        self.shared = None;
        shared.settle(outcome);
    }
}

impl Drop for LoadTask {
    fn drop(&mut self) {
        if let Some(shared) = self.shared.take() {
            warn!("SDK load dropped before settling");
            shared.settle(Err(LoadError::Abandoned));
        }
    }
}

impl fmt::Debug for ReadinessBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadinessBroker")
            .field("status", &self.current_status())
            .field("attempts", &self.load_attempts())
            .field("summary", &self.shared.summary)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeInjector, FakeOutcome};
    use futures::poll;
    use gmaps_config::LoaderConfig;
    use gmaps_core::Library;
    use std::time::Duration;

    fn broker_with(config: LoaderConfig, injector: Arc<FakeInjector>) -> ReadinessBroker {
        let mut state = LoaderState::new();
        state.initialize_with(config).unwrap();
        ReadinessBroker::new(state, injector).unwrap()
    }

    fn broker(injector: Arc<FakeInjector>) -> ReadinessBroker {
        broker_with(LoaderConfig::new("K1", ["places"]).unwrap(), injector)
    }

    #[test]
    fn uninitialized_state_is_rejected() {
        let injector = Arc::new(FakeInjector::ready("3"));
        let err = ReadinessBroker::new(LoaderState::new(), injector).unwrap_err();
        assert_eq!(err, ConfigError::NotInitialized);
    }

    #[tokio::test]
    async fn concurrent_acquires_share_one_load() {
        let injector = Arc::new(FakeInjector::ready("3.55").gated());
        let broker = broker(injector.clone());

        let a = broker.acquire();
        let b = broker.acquire();
        let c = broker.acquire();
        tokio::pin!(a, b, c);
        assert!(poll!(a.as_mut()).is_pending());
        assert!(poll!(b.as_mut()).is_pending());
        assert!(poll!(c.as_mut()).is_pending());
        assert_eq!(broker.current_status(), LoadStatus::Loading);

        injector.release();
        let (a, b, c) = tokio::join!(a, b, c);
        let handle = a.unwrap();
        assert_eq!(b.unwrap(), handle);
        assert_eq!(c.unwrap(), handle);

        assert_eq!(injector.calls(), 1);
        assert_eq!(injector.overlaps(), 0);
        assert_eq!(broker.current_status(), LoadStatus::Ready);

        let request = &injector.requests()[0];
        assert_eq!(request.credential.expose(), "K1");
        assert_eq!(request.libraries.iter().copied().collect::<Vec<_>>(), vec![Library::Places]);
    }

    #[tokio::test]
    async fn many_spawned_consumers_load_once() {
        let injector = Arc::new(FakeInjector::ready("3.55"));
        let broker = broker(injector.clone());

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let broker = broker.clone();
                tokio::spawn(async move { broker.acquire().await })
            })
            .collect();
        let mut handles = Vec::new();
        for task in tasks {
            handles.push(task.await.unwrap().unwrap());
        }

        assert_eq!(injector.calls(), 1);
        assert!(handles.windows(2).all(|w| w[0] == w[1]));
    }

    #[tokio::test]
    async fn acquire_after_ready_does_not_reload() {
        let injector = Arc::new(FakeInjector::ready("3.55"));
        let broker = broker(injector.clone());

        let first = broker.acquire().await.unwrap();
        let second = broker.acquire().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(injector.calls(), 1);
        assert_eq!(broker.load_attempts(), 1);
    }

    #[tokio::test]
    async fn current_status_never_triggers_a_load() {
        let injector = Arc::new(FakeInjector::ready("3.55"));
        let broker = broker(injector.clone());
        assert_eq!(broker.current_status(), LoadStatus::NotStarted);
        tokio::task::yield_now().await;
        assert_eq!(injector.calls(), 0);
    }

    #[tokio::test]
    async fn failure_reaches_every_waiter_and_is_terminal() {
        let network = LoadError::Network("dns lookup failed".into());
        let injector = Arc::new(FakeInjector::failing(network.clone()).gated());
        let broker = broker(injector.clone());

        let a = broker.acquire();
        let b = broker.acquire();
        tokio::pin!(a, b);
        assert!(poll!(a.as_mut()).is_pending());
        assert!(poll!(b.as_mut()).is_pending());
        injector.release();
        let (a, b) = tokio::join!(a, b);
        assert_eq!(a.unwrap_err(), network);
        assert_eq!(b.unwrap_err(), network);

        assert_eq!(broker.acquire().await.unwrap_err(), network);
        assert_eq!(broker.current_status(), LoadStatus::Failed);
        assert_eq!(injector.calls(), 1);
    }

    #[tokio::test]
    async fn reset_allows_a_fresh_attempt() {
        let injector = Arc::new(FakeInjector::scripted([
            FakeOutcome::Fail(LoadError::Network("offline".into())),
            FakeOutcome::Ready("3.56".into()),
        ]));
        let broker = broker(injector.clone());

        assert!(broker.acquire().await.is_err());
        broker.reset().unwrap();
        assert_eq!(broker.current_status(), LoadStatus::NotStarted);
        assert_eq!(injector.resets(), 1);

        let handle = broker.acquire().await.unwrap();
        assert_eq!(handle.version(), "3.56");
        assert_eq!(injector.calls(), 2);
    }

    #[tokio::test]
    async fn reset_is_rejected_while_loading() {
        let injector = Arc::new(FakeInjector::ready("3.55").gated());
        let broker = broker(injector.clone());

        let pending = broker.acquire();
        tokio::pin!(pending);
        assert!(poll!(pending.as_mut()).is_pending());
        assert!(broker.reset().is_err());

        injector.release();
        assert!(pending.await.is_ok());
        assert_eq!(injector.resets(), 0);
    }

    #[tokio::test]
    async fn dropping_the_trigger_does_not_abort_the_load() {
        let injector = Arc::new(FakeInjector::ready("3.55").gated());
        let broker = broker(injector.clone());

        {
            let trigger = broker.acquire();
            tokio::pin!(trigger);
            assert!(poll!(trigger.as_mut()).is_pending());
        }

        let waiter = broker.acquire();
        tokio::pin!(waiter);
        assert!(poll!(waiter.as_mut()).is_pending());
        injector.release();
        assert!(waiter.await.is_ok());
        assert_eq!(injector.calls(), 1);
    }

    #[tokio::test]
    async fn transient_failures_are_retried_within_one_load() {
        let injector = Arc::new(FakeInjector::scripted([
            FakeOutcome::Fail(LoadError::Network("reset by peer".into())),
            FakeOutcome::Fail(LoadError::Network("reset by peer".into())),
            FakeOutcome::Ready("3.55".into()),
        ]));
        let config = LoaderConfig::new("K1", ["places"]).unwrap().with_retry(RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        });
        let broker = broker_with(config, injector.clone());

        assert!(broker.acquire().await.is_ok());
        assert_eq!(injector.calls(), 3);
        assert_eq!(injector.resets(), 2);
        assert_eq!(broker.load_attempts(), 3);
    }

    #[tokio::test]
    async fn retry_budget_is_bounded() {
        let injector = Arc::new(FakeInjector::failing(LoadError::Network("offline".into())));
        let config = LoaderConfig::new("K1", ["places"]).unwrap().with_retry(RetryPolicy {
            max_attempts: 2,
            backoff: Duration::from_millis(1),
        });
        let broker = broker_with(config, injector.clone());

        assert!(matches!(broker.acquire().await, Err(LoadError::Network(_))));
        assert_eq!(injector.calls(), 2);
    }

    #[tokio::test]
    async fn credential_failures_are_not_retried() {
        let injector = Arc::new(FakeInjector::scripted([
            FakeOutcome::Fail(LoadError::Credential("RefererNotAllowedMapError".into())),
            FakeOutcome::Ready("3.55".into()),
        ]));
        let config = LoaderConfig::new("K1", ["places"]).unwrap().with_retry(RetryPolicy {
            max_attempts: 5,
            backoff: Duration::from_millis(1),
        });
        let broker = broker_with(config, injector.clone());

        assert!(matches!(broker.acquire().await, Err(LoadError::Credential(_))));
        assert_eq!(injector.calls(), 1);
    }

    #[tokio::test]
    async fn panicking_injector_fails_all_waiters() {
        let injector = Arc::new(FakeInjector::scripted([FakeOutcome::Panic]));
        let broker = broker(injector.clone());

        let (a, b) = tokio::join!(broker.acquire(), broker.acquire());
        assert!(matches!(a, Err(LoadError::Internal(_))));
        assert_eq!(a.unwrap_err(), b.unwrap_err());
        assert_eq!(broker.current_status(), LoadStatus::Failed);
    }

    fn current_thread_runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    #[test]
    fn acquire_outside_a_runtime_fails_without_starting_a_load() {
        let injector = Arc::new(FakeInjector::ready("3.55"));
        let broker = broker(injector.clone());

        let outcome = futures::executor::block_on(broker.acquire());
        assert!(matches!(outcome, Err(LoadError::Internal(_))));
        assert_eq!(broker.current_status(), LoadStatus::NotStarted);
        assert_eq!(injector.calls(), 0);

        let handle = current_thread_runtime().block_on(broker.acquire()).unwrap();
        assert_eq!(handle.version(), "3.55");
        assert_eq!(injector.calls(), 1);
    }

    #[test]
    fn load_dropped_with_its_runtime_settles_as_abandoned() {
        let injector = Arc::new(FakeInjector::ready("3.55").gated());
        let broker = broker(injector.clone());

        let first = current_thread_runtime();
        first.block_on(async {
            let trigger = broker.acquire();
            tokio::pin!(trigger);
            assert!(poll!(trigger.as_mut()).is_pending());
            assert_eq!(broker.current_status(), LoadStatus::Loading);
        });
        drop(first);

        assert_eq!(broker.current_status(), LoadStatus::Failed);
        let second = current_thread_runtime();
        assert_eq!(second.block_on(broker.acquire()).unwrap_err(), LoadError::Abandoned);

        broker.reset().unwrap();
        assert_eq!(broker.current_status(), LoadStatus::NotStarted);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn waiters_are_released_in_arrival_order() {
        let injector = Arc::new(FakeInjector::ready("3.55").gated());
        let broker = broker(injector.clone());
        let released = Arc::new(Mutex::new(Vec::new()));

        let tasks: Vec<_> = (0..5)
            .map(|i| {
                let broker = broker.clone();
                let released = Arc::clone(&released);
                tokio::spawn(async move {
                    let outcome = broker.acquire().await;
                    released.lock().unwrap().push(i);
                    outcome
                })
            })
            .collect();
        while broker.shared.lock().waiters.len() < 5 {
            tokio::task::yield_now().await;
        }

        injector.release();
        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(*released.lock().unwrap(), vec![0, 1, 2, 3, 4]);
        assert_eq!(injector.calls(), 1);
    }
}
