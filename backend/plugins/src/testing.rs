//! Deterministic injector for tests of code built on the broker.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use gmaps_core::{LoadError, SdkHandle, SdkInfo};
use tokio::sync::Notify;

use crate::injector::ScriptInjector;
use crate::request::ScriptRequest;

/// Result a [`FakeInjector`] produces for one `load` call.
#[derive(Debug, Clone)]
pub enum FakeOutcome {
    Ready(String),
    Fail(LoadError),
    Panic,
}

/// Scripted injector: outcomes are consumed in order and the last one repeats.
///
/// A gated injector holds every load until [`FakeInjector::release`] is called,
/// which lets tests observe the `Loading` state. Overlapping loads are
/// answered with [`LoadError::DuplicateLoad`] and counted.
pub struct FakeInjector {
    outcomes: Mutex<VecDeque<FakeOutcome>>,
    gated: bool,
    gate: Notify,
    calls: AtomicUsize,
    overlaps: AtomicUsize,
    resets: AtomicUsize,
    in_flight: AtomicBool,
    requests: Mutex<Vec<ScriptRequest>>,
}

impl FakeInjector {
    pub fn scripted(outcomes: impl IntoIterator<Item = FakeOutcome>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().collect()),
            gated: false,
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
            overlaps: AtomicUsize::new(0),
            resets: AtomicUsize::new(0),
            in_flight: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ready(version: impl Into<String>) -> Self {
        Self::scripted([FakeOutcome::Ready(version.into())])
    }

    pub fn failing(error: LoadError) -> Self {
        Self::scripted([FakeOutcome::Fail(error)])
    }

    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    /// Let one held (or the next) load proceed.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Loads that started while another was still running.
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ScriptRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn next_outcome(&self) -> FakeOutcome {
        let mut outcomes = self.outcomes.lock().unwrap_or_else(|e| e.into_inner());
        if outcomes.len() > 1 {
            outcomes.pop_front().unwrap_or(FakeOutcome::Panic)
        } else {
            outcomes.front().cloned().unwrap_or(FakeOutcome::Panic)
        }
    }
}

#[async_trait]
impl ScriptInjector for FakeInjector {
    async fn load(&self, request: &ScriptRequest) -> Result<SdkHandle, LoadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
            return Err(LoadError::DuplicateLoad);
        }
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        if self.gated {
            self.gate.notified().await;
        }
        let outcome = self.next_outcome();
        self.in_flight.store(false, Ordering::SeqCst);

        match outcome {
            FakeOutcome::Ready(version) => Ok(SdkHandle::new(SdkInfo {
                version,
                libraries: request.libraries.clone(),
                loaded_at: Utc::now(),
            })),
            FakeOutcome::Fail(err) => Err(err),
            FakeOutcome::Panic => panic!("fake injector told to panic"),
        }
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}
