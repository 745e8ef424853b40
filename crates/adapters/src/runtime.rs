// SPDX-License-Identifier: MIT

//! Graph runtime adapter: the exclusive-ownership ticket over the external
//! stream runtime (spec §3 "Graph runtime handle", §5).

use async_trait::async_trait;
use daq_core::DaqError;

/// The external stream runtime that actually schedules nodes and carries
/// buffers between them. Out of scope for this crate (spec §1) — this
/// trait is the seam the DAQ controller drives it through.
#[async_trait]
pub trait GraphRuntime: Send + Sync + 'static {
    /// Resume (unpause) the running graph.
    async fn resume(&self) -> Result<(), DaqError>;
    /// Pause the running graph.
    async fn pause(&self) -> Result<(), DaqError>;
    /// Cancel the graph irrecoverably. Idempotent.
    async fn cancel(&self) -> Result<(), DaqError>;
    /// Block until the graph exits (normally or via error), returning the
    /// captured exception slot per spec §4.5/§7.
    async fn run(&self) -> RunOutcome;
}

/// The outcome the runtime hands back after `run()` returns, dispatched by
/// the controller into one of the four error buckets (spec §7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Graph exited normally (e.g. in response to `cancel`/`pause` + teardown).
    Normal,
    /// A non-fatal node error was raised; the controller should do-restart.
    NonFatalNodeError(String),
    /// A fatal device/node error; the controller must enter `error` and
    /// signal the host process.
    FatalError(String),
}

/// Exclusive ownership ticket over a [`GraphRuntime`]. At most one handle
/// exists at a time (spec §3, §5, §8 invariant 2); the controller is the
/// sole holder while the graph is live. The generation counter rejects a
/// handle from a previous activation that outlived its runtime (the
/// runtime is single-use per activation, spec §4.2 `must_reset`).
#[derive(Clone)]
pub struct RuntimeHandle<R> {
    runtime: std::sync::Arc<R>,
    generation: u64,
}

impl<R: GraphRuntime> RuntimeHandle<R> {
    pub fn new(runtime: std::sync::Arc<R>, generation: u64) -> Self {
        Self { runtime, generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub async fn resume(&self) -> Result<(), DaqError> {
        self.runtime.resume().await
    }

    pub async fn pause(&self) -> Result<(), DaqError> {
        self.runtime.pause().await
    }

    pub async fn cancel(&self) -> Result<(), DaqError> {
        self.runtime.cancel().await
    }

    pub async fn run(&self) -> RunOutcome {
        self.runtime.run().await
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Recorded call into the fake runtime, for test assertions.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RuntimeCall {
        Resume,
        Pause,
        Cancel,
    }

    struct FakeState {
        calls: Vec<RuntimeCall>,
        next_outcome: RunOutcome,
        resume_err: Option<DaqError>,
    }

    /// Fake [`GraphRuntime`] that records calls and returns a configurable
    /// outcome from `run()`.
    ///
    /// `run()` blocks, the way the real runtime does, until `cancel()` is
    /// called or [`FakeGraphRuntime::finish_run`] is used to simulate the
    /// graph exiting on its own (e.g. a node error). A `watch` channel is
    /// level-triggered, so there is no lost-wakeup window between a caller
    /// checking "has it exited yet" and starting to wait.
    #[derive(Clone)]
    pub struct FakeGraphRuntime {
        inner: Arc<Mutex<FakeState>>,
        exit_tx: Arc<tokio::sync::watch::Sender<bool>>,
        exit_rx: tokio::sync::watch::Receiver<bool>,
    }

    impl Default for FakeGraphRuntime {
        fn default() -> Self {
            let (exit_tx, exit_rx) = tokio::sync::watch::channel(false);
            Self {
                inner: Arc::new(Mutex::new(FakeState {
                    calls: Vec::new(),
                    next_outcome: RunOutcome::Normal,
                    resume_err: None,
                })),
                exit_tx: Arc::new(exit_tx),
                exit_rx,
            }
        }
    }

    impl FakeGraphRuntime {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<RuntimeCall> {
            self.inner.lock().calls.clone()
        }

        pub fn set_next_outcome(&self, outcome: RunOutcome) {
            self.inner.lock().next_outcome = outcome;
        }

        pub fn fail_resume_with(&self, err: DaqError) {
            self.inner.lock().resume_err = Some(err);
        }

        /// Make `run()` return immediately with whatever outcome is
        /// currently configured, as if the graph exited on its own.
        pub fn finish_run(&self) {
            let _ = self.exit_tx.send(true);
        }
    }

    #[async_trait]
    impl GraphRuntime for FakeGraphRuntime {
        async fn resume(&self) -> Result<(), DaqError> {
            let mut state = self.inner.lock();
            state.calls.push(RuntimeCall::Resume);
            if let Some(err) = state.resume_err.clone() {
                return Err(err);
            }
            Ok(())
        }

        async fn pause(&self) -> Result<(), DaqError> {
            self.inner.lock().calls.push(RuntimeCall::Pause);
            Ok(())
        }

        async fn cancel(&self) -> Result<(), DaqError> {
            self.inner.lock().calls.push(RuntimeCall::Cancel);
            let _ = self.exit_tx.send(true);
            Ok(())
        }

        async fn run(&self) -> RunOutcome {
            let mut rx = self.exit_rx.clone();
            if !*rx.borrow() {
                let _ = rx.changed().await;
            }
            self.inner.lock().next_outcome.clone()
        }
    }
}

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;
