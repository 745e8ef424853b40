// SPDX-License-Identifier: MIT

//! DAQ controller (spec §4.5): the central state machine. Supervises the
//! graph runtime; implements activate/deactivate/run/stop/reactivate;
//! dispatches reconfiguration and run-command requests to nodes.
//!
//! The spec describes the controller as a loop blocking on a condition
//! variable in `deactivated`, waking on state changes. This crate models
//! the same event-driven behaviour with `tokio` tasks and `Notify` rather
//! than a literal polling loop (SPEC_FULL §5 ambient note) — each
//! transition method drives the next state and, where the spec's loop
//! would "hand control to the runtime", spawns a task that awaits it.

use daq_adapters::{ChatNotifier, AlertSeverity, GraphRuntime, HostSignal, RunOutcome, RuntimeHandle};
use daq_core::{Clock, DaqError, DaqResult, DaqStatus, FileIntent, RunContext};
use daq_files::{FileCoordinator, PrepareConfig};
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::stream_manager::StreamManager;

/// Tunables that are real, non-distilled behaviour of the original control
/// loop (SPEC_FULL §4.5, §9) rather than invented knobs.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Mirrors `activate-at-startup` in the original DAQ config node.
    pub activate_at_startup: bool,
    /// Delay before the fire-and-forget startup activation (spec §9).
    pub startup_activation_delay: Duration,
    /// Delay before an automatic re-activation out of `do-restart` (S4: "within ~500 ms").
    pub restart_delay: Duration,
    /// Delay `reactivate()` waits between `deactivate` and `activate`.
    pub reactivate_delay: Duration,
    /// Channel metadata installed on every stream at `prepare_all` time (spec §4.3, §6).
    pub channel_metadata: Vec<daq_files::ChannelMetadata>,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            activate_at_startup: false,
            startup_activation_delay: Duration::from_millis(250),
            restart_delay: Duration::from_millis(400),
            reactivate_delay: Duration::from_millis(50),
            channel_metadata: Vec::new(),
        }
    }
}

struct Properties {
    duration_ms: u64,
    use_monarch: bool,
}

impl Default for Properties {
    fn default() -> Self {
        Self { duration_ms: 1000, use_monarch: false }
    }
}

struct Inner<R: GraphRuntime, N: ChatNotifier, C: Clock, S: HostSignal> {
    status: Mutex<DaqStatus>,
    status_notify: Notify,
    stream_manager: StreamManager<R>,
    files: Arc<FileCoordinator>,
    chat: N,
    clock: C,
    signal: S,
    config: ControllerConfig,
    properties: Mutex<Properties>,
    run_context: Mutex<Option<RunContext>>,
    runtime_handle: Mutex<Option<RuntimeHandle<R>>>,
    run_task: Mutex<Option<JoinHandle<()>>>,
    break_flag: AtomicBool,
    stop_notify: Notify,
    cancel_requested: AtomicBool,
}

/// Central state machine owning the life-cycle of the active graph (spec
/// §4.5). Cheap to `Clone` (an `Arc` handle) so it can be shared with a
/// spawned background task or a request dispatcher.
pub struct DaqController<R: GraphRuntime, N: ChatNotifier, C: Clock, S: HostSignal = daq_adapters::RealHostSignal> {
    inner: Arc<Inner<R, N, C, S>>,
}

impl<R: GraphRuntime, N: ChatNotifier, C: Clock, S: HostSignal> Clone for DaqController<R, N, C, S> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

impl<R: GraphRuntime, N: ChatNotifier, C: Clock, S: HostSignal> DaqController<R, N, C, S> {
    pub fn new(
        stream_manager: StreamManager<R>,
        files: Arc<FileCoordinator>,
        chat: N,
        clock: C,
        signal: S,
        config: ControllerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                status: Mutex::new(DaqStatus::Deactivated),
                status_notify: Notify::new(),
                stream_manager,
                files,
                chat,
                clock,
                signal,
                config,
                properties: Mutex::new(Properties::default()),
                run_context: Mutex::new(None),
                runtime_handle: Mutex::new(None),
                run_task: Mutex::new(None),
                break_flag: AtomicBool::new(false),
                stop_notify: Notify::new(),
                cancel_requested: AtomicBool::new(false),
            }),
        }
    }

    pub fn status(&self) -> DaqStatus {
        *self.inner.status.lock()
    }

    pub fn stream_manager(&self) -> &StreamManager<R> {
        &self.inner.stream_manager
    }

    pub fn files(&self) -> &Arc<FileCoordinator> {
        &self.inner.files
    }

    /// Start the controller's event-driven loop. In this design there is no
    /// literal blocking loop thread: this only schedules the
    /// `activate-at-startup` fire-and-forget task, per spec §9.
    pub fn execute(&self) {
        if self.inner.config.activate_at_startup {
            let ctl = self.clone();
            let delay = self.inner.config.startup_activation_delay;
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if ctl.inner.cancel_requested.load(Ordering::Acquire) {
                    return;
                }
                let _ = ctl.activate().await;
            });
        }
    }

    fn set_status(&self, next: DaqStatus) {
        let mut status = self.inner.status.lock();
        tracing::info!(from = %*status, to = %next, "daq status transition");
        *status = next;
        self.inner.status_notify.notify_waiters();
    }

    async fn alert(&self, severity: AlertSeverity, message: impl Into<String>) {
        let message = message.into();
        self.inner.chat.alert(severity, &message).await;
    }

    fn status_error(&self, op: &'static str, current: DaqStatus) -> DaqError {
        let msg = format!("{op} invalid in state {current}");
        tracing::warn!(op, %current, "status error");
        DaqError::status(msg)
    }

    // ---- activate / deactivate / reactivate -------------------------------

    /// Activate the graph (spec §4.5). Callable from `deactivated` (the
    /// normal path) and from `do-restart` (the diagram's automatic
    /// `do-restart ──► activating` edge, driven by [`schedule_restart`](Self::schedule_restart)).
    pub async fn activate(&self) -> DaqResult<()> {
        {
            let mut status = self.inner.status.lock();
            if *status != DaqStatus::Deactivated && *status != DaqStatus::DoRestart {
                return Err(self.status_error("activate", *status));
            }
            tracing::info!(from = %*status, to = %DaqStatus::Activating, "daq status transition");
            *status = DaqStatus::Activating;
            self.inner.status_notify.notify_waiters();
        }

        // `teardown` destroys bindings on every exit (spec §3); rebuild an
        // equivalent graph from the last successful `configure` before
        // touching the runtime. A failure here is a config/status-class
        // error (spec §7), not a device error — return it to the caller
        // and settle back in `deactivated` rather than entering `error`
        // and signalling the host process.
        if let Err(e) = self.inner.stream_manager.reconfigure_if_needed() {
            self.fail_activation(&e).await;
            return Err(e);
        }

        if self.inner.stream_manager.must_reset() {
            if let Err(e) = self.inner.stream_manager.reset() {
                self.fail_activation(&e).await;
                return Err(e);
            }
        }

        let handle = match self.inner.stream_manager.acquire_runtime() {
            Ok(h) => h,
            Err(e) => {
                self.fail_activation(&e).await;
                return Err(e);
            }
        };

        *self.inner.runtime_handle.lock() = Some(handle.clone());
        self.set_status(DaqStatus::Activated);

        let ctl = self.clone();
        let task = tokio::spawn(async move {
            let outcome = handle.run().await;
            ctl.on_runtime_exit(outcome).await;
        });
        *self.inner.run_task.lock() = Some(task);

        Ok(())
    }

    /// A recoverable failure while setting up activation (graph
    /// reconfiguration, runtime reset/acquire): return to `deactivated`
    /// rather than `error` (spec §7 — only device errors during a run and
    /// unrecoverable runtime exceptions signal the host process).
    async fn fail_activation(&self, err: &DaqError) {
        tracing::warn!(%err, "activation setup failed, reverting to deactivated");
        self.set_status(DaqStatus::Deactivated);
    }

    pub async fn deactivate(&self) -> DaqResult<()> {
        {
            let mut status = self.inner.status.lock();
            if *status != DaqStatus::Activated {
                return Err(self.status_error("deactivate", *status));
            }
            tracing::info!(from = %*status, to = %DaqStatus::Deactivating, "daq status transition");
            *status = DaqStatus::Deactivating;
            self.inner.status_notify.notify_waiters();
        }

        let handle = self.inner.runtime_handle.lock().clone();
        if let Some(handle) = handle {
            let _ = handle.cancel().await;
        }
        self.join_run_task().await;
        Ok(())
    }

    /// Deactivate, wait a short delay, then re-activate. The run context is
    /// not reused across a reactivation (spec §9 open question, resolved:
    /// matches the original, which resets it).
    pub async fn reactivate(&self) -> DaqResult<()> {
        let _ = self.deactivate().await;
        *self.inner.run_context.lock() = None;
        tokio::time::sleep(self.inner.config.reactivate_delay).await;
        self.activate().await
    }

    async fn join_run_task(&self) {
        let task = self.inner.run_task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    async fn on_runtime_exit(&self, outcome: RunOutcome) {
        if let Some(handle) = self.inner.runtime_handle.lock().take() {
            self.inner.stream_manager.release_runtime(handle);
        }
        self.inner.stream_manager.teardown();

        if self.status() == DaqStatus::Canceled {
            self.set_status(DaqStatus::Done);
            return;
        }

        match outcome {
            RunOutcome::Normal => {
                self.set_status(DaqStatus::Deactivated);
            }
            RunOutcome::NonFatalNodeError(msg) => {
                tracing::warn!(%msg, "non-fatal node error, scheduling do-restart");
                self.alert(AlertSeverity::Warning, format!("non-fatal node error: {msg}")).await;
                self.set_status(DaqStatus::DoRestart);
                self.schedule_restart();
            }
            RunOutcome::FatalError(msg) => {
                self.enter_error(msg).await;
            }
        }
    }

    fn schedule_restart(&self) {
        let ctl = self.clone();
        let delay = self.inner.config.restart_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if ctl.inner.cancel_requested.load(Ordering::Acquire) {
                return;
            }
            let _ = ctl.activate().await;
        });
    }

    async fn enter_error(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(%message, "daq controller entering error state");
        self.set_status(DaqStatus::Error);
        self.alert(AlertSeverity::Critical, message).await;
        self.inner.signal.raise_sigint();
    }

    // ---- run / stop / cancel ----------------------------------------------

    /// Begin a timed or untimed run (spec §4.5 `start_run`). `duration_ms`
    /// overrides the `duration` property for this run only if present.
    /// `filenames`/`descriptions` override the already-declared per-file
    /// records by position (spec §8 boundary: indices past the declared
    /// count fail with `out-of-range`, prior indices still applied).
    pub async fn start_run(
        &self,
        duration_ms: Option<u64>,
        filenames: Vec<String>,
        descriptions: Vec<String>,
    ) -> DaqResult<()> {
        {
            let status = self.status();
            if status != DaqStatus::Activated {
                return Err(self.status_error("start_run", status));
            }
        }

        // Apply prior indices even if a later one is out-of-range (spec §8
        // boundary), but don't start a run at all if any index was
        // rejected — the requester gets a real error reply, not a reply
        // saying "out of range" for a run that started anyway.
        let mut out_of_range = None;
        for (i, name) in filenames.into_iter().enumerate() {
            if let Err(e) = self.inner.files.set_filename(i, name) {
                out_of_range.get_or_insert(e);
                break;
            }
        }
        for (i, desc) in descriptions.into_iter().enumerate() {
            if let Err(e) = self.inner.files.set_description(i, desc) {
                out_of_range.get_or_insert(e);
                break;
            }
        }
        if let Some(e) = out_of_range {
            return Err(e);
        }

        let (duration_ms, use_files) = {
            let props = self.inner.properties.lock();
            (duration_ms.unwrap_or(props.duration_ms), props.use_monarch)
        };

        let files: Vec<FileIntent> = (0..self.inner.files.count())
            .map(|i| FileIntent {
                filename: self.inner.files.filename(i).unwrap_or_default(),
                description: self.inner.files.description(i).unwrap_or_default(),
            })
            .collect();

        let ctx = RunContext::new(duration_ms, use_files, files);
        self.inner.break_flag.store(false, Ordering::Release);
        *self.inner.run_context.lock() = Some(ctx.clone());

        let ctl = self.clone();
        tokio::spawn(async move {
            ctl.do_run(ctx).await;
        });

        Ok(())
    }

    /// The numbered `do_run` steps from spec §4.5.
    async fn do_run(&self, ctx: RunContext) {
        if ctx.use_files {
            let config = PrepareConfig {
                run_duration_ms: ctx.duration_ms,
                timestamp_epoch_ms: self.inner.clock.epoch_ms(),
                channels: self.inner.config.channel_metadata.clone(),
            };
            if let Err(e) = self.inner.files.prepare_all(&config) {
                self.enter_error(format!("file prepare failed: {e}")).await;
                self.cancel_graph_best_effort().await;
                return;
            }
        }

        let handle = self.inner.runtime_handle.lock().clone();
        if let Some(handle) = &handle {
            if let Err(e) = handle.resume().await {
                self.enter_error(format!("failed to resume graph: {e}")).await;
                self.cancel_graph_best_effort().await;
                return;
            }
        }

        self.set_status(DaqStatus::Running);
        self.alert(AlertSeverity::Notice, format!("run {} started", ctx.run_id)).await;

        let deadline = if ctx.is_untimed() { None } else { Some(Instant::now() + Duration::from_millis(ctx.duration_ms)) };
        loop {
            if self.inner.cancel_requested.load(Ordering::Acquire) {
                break;
            }
            if self.inner.break_flag.load(Ordering::Acquire) {
                break;
            }
            if let Some(dl) = deadline {
                if Instant::now() >= dl {
                    break;
                }
            }

            let sub_interval = Duration::from_millis(500);
            let wait = match deadline {
                Some(dl) => sub_interval.min(dl.saturating_duration_since(Instant::now())),
                None => sub_interval,
            };

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = self.inner.stop_notify.notified() => {}
            }
        }
        self.inner.break_flag.store(false, Ordering::Release);

        if let Some(handle) = &handle {
            let _ = handle.pause().await;
        }

        if self.status() == DaqStatus::Running {
            self.set_status(DaqStatus::Activated);
        }
        self.alert(AlertSeverity::Notice, format!("run {} stopped", ctx.run_id)).await;

        if ctx.use_files {
            if let Err(e) = self.inner.files.finish_all() {
                self.enter_error(format!("file finish failed: {e}")).await;
                return;
            }
        }

        *self.inner.run_context.lock() = None;
    }

    async fn cancel_graph_best_effort(&self) {
        let handle = self.inner.runtime_handle.lock().clone();
        if let Some(handle) = handle {
            let _ = handle.cancel().await;
        }
    }

    /// Stop the current run (spec §4.5). Untimed runs block until this is
    /// called; timed runs may also be stopped early.
    pub fn stop_run(&self) -> DaqResult<()> {
        if self.inner.run_context.lock().is_none() {
            return Err(DaqError::status("stop_run with no active run"));
        }
        self.inner.break_flag.store(true, Ordering::Release);
        self.inner.stop_notify.notify_waiters();
        Ok(())
    }

    /// Cancel the controller from any state. A running graph is paused
    /// first. Idempotent: `cancel(); cancel()` is indistinguishable from a
    /// single call.
    pub async fn cancel(&self) -> DaqResult<()> {
        if self.status().is_terminal() {
            return Ok(());
        }

        if self.status() == DaqStatus::Running {
            self.inner.break_flag.store(true, Ordering::Release);
            self.inner.stop_notify.notify_waiters();
        }
        self.inner.cancel_requested.store(true, Ordering::Release);

        self.set_status(DaqStatus::Canceled);

        let handle = self.inner.runtime_handle.lock().clone();
        if let Some(handle) = handle {
            let _ = handle.cancel().await;
        }

        self.join_run_task().await;

        if self.status() == DaqStatus::Canceled {
            self.set_status(DaqStatus::Done);
        }
        Ok(())
    }

    // ---- online reconfiguration --------------------------------------------

    pub fn apply_config(&self, node: &str, cfg: Value) -> DaqResult<()> {
        if !self.status().bindings_available() {
            return Err(DaqError::NoBindings);
        }
        let binder = self.inner.stream_manager.binding(node).ok_or_else(|| DaqError::NotFound(node.to_string()))?;
        binder.apply_config(&cfg)
    }

    pub fn dump_config(&self, node: &str) -> DaqResult<Value> {
        if !self.status().bindings_available() {
            return Err(DaqError::NoBindings);
        }
        let binder = self.inner.stream_manager.binding(node).ok_or_else(|| DaqError::NotFound(node.to_string()))?;
        Ok(binder.dump_config())
    }

    pub fn run_command(&self, node: &str, cmd: &str, args: Value) -> DaqResult<bool> {
        if !self.status().bindings_available() {
            return Err(DaqError::NoBindings);
        }
        let binder = self.inner.stream_manager.binding(node).ok_or_else(|| DaqError::NotFound(node.to_string()))?;
        binder.run_command(cmd, &args)
    }

    // ---- per-file / per-run properties -------------------------------------

    pub fn filename(&self, index: usize) -> DaqResult<String> {
        Ok(self.inner.files.filename(index)?)
    }

    pub fn set_filename(&self, index: usize, value: impl Into<String>) -> DaqResult<()> {
        Ok(self.inner.files.set_filename(index, value)?)
    }

    pub fn description(&self, index: usize) -> DaqResult<String> {
        Ok(self.inner.files.description(index)?)
    }

    pub fn set_description(&self, index: usize, value: impl Into<String>) -> DaqResult<()> {
        Ok(self.inner.files.set_description(index, value)?)
    }

    pub fn duration(&self) -> u64 {
        self.inner.properties.lock().duration_ms
    }

    /// Zero is forbidden for `set` (spec §4.5 "zero forbidden for set;
    /// default 1000"); zero is only meaningful as the run-time override
    /// passed to [`start_run`](Self::start_run) meaning "untimed".
    pub fn set_duration(&self, value: u64) -> DaqResult<()> {
        if value == 0 {
            return Err(DaqError::BadPayload("duration must be nonzero".to_string()));
        }
        self.inner.properties.lock().duration_ms = value;
        Ok(())
    }

    pub fn use_monarch(&self) -> bool {
        self.inner.properties.lock().use_monarch
    }

    pub fn set_use_monarch(&self, value: bool) {
        self.inner.properties.lock().use_monarch = value;
    }

    /// `{status, status-value}` for the `daq-status` reply (spec §6).
    pub fn daq_status(&self) -> (DaqStatus, i32) {
        let status = self.status();
        (status, status.value())
    }
}

/// Request-side surface the reconfiguration/run-command routing-keys
/// (spec §6) need, kept free of any transport dependency so `daq-wire` can
/// depend on it without depending on `tokio`'s task machinery directly.
#[async_trait::async_trait]
pub trait DaqControl: Send + Sync {
    async fn activate(&self) -> DaqResult<()>;
    async fn deactivate(&self) -> DaqResult<()>;
    async fn reactivate(&self) -> DaqResult<()>;
    async fn start_run(&self, duration_ms: Option<u64>, filenames: Vec<String>, descriptions: Vec<String>) -> DaqResult<()>;
    fn stop_run(&self) -> DaqResult<()>;
    async fn cancel(&self) -> DaqResult<()>;

    fn apply_config(&self, node: &str, cfg: Value) -> DaqResult<()>;
    fn dump_config(&self, node: &str) -> DaqResult<Value>;
    fn run_command(&self, node: &str, cmd: &str, args: Value) -> DaqResult<bool>;

    fn filename(&self, index: usize) -> DaqResult<String>;
    fn set_filename(&self, index: usize, value: String) -> DaqResult<()>;
    fn description(&self, index: usize) -> DaqResult<String>;
    fn set_description(&self, index: usize, value: String) -> DaqResult<()>;
    fn duration(&self) -> u64;
    fn set_duration(&self, value: u64) -> DaqResult<()>;
    fn use_monarch(&self) -> bool;
    fn set_use_monarch(&self, value: bool);

    fn daq_status(&self) -> (DaqStatus, i32);
}

#[async_trait::async_trait]
impl<R, N, C, S> DaqControl for DaqController<R, N, C, S>
where
    R: GraphRuntime,
    N: ChatNotifier,
    C: Clock,
    S: HostSignal,
{
    async fn activate(&self) -> DaqResult<()> {
        DaqController::activate(self).await
    }
    async fn deactivate(&self) -> DaqResult<()> {
        DaqController::deactivate(self).await
    }
    async fn reactivate(&self) -> DaqResult<()> {
        DaqController::reactivate(self).await
    }
    async fn start_run(&self, duration_ms: Option<u64>, filenames: Vec<String>, descriptions: Vec<String>) -> DaqResult<()> {
        DaqController::start_run(self, duration_ms, filenames, descriptions).await
    }
    fn stop_run(&self) -> DaqResult<()> {
        DaqController::stop_run(self)
    }
    async fn cancel(&self) -> DaqResult<()> {
        DaqController::cancel(self).await
    }
    fn apply_config(&self, node: &str, cfg: Value) -> DaqResult<()> {
        DaqController::apply_config(self, node, cfg)
    }
    fn dump_config(&self, node: &str) -> DaqResult<Value> {
        DaqController::dump_config(self, node)
    }
    fn run_command(&self, node: &str, cmd: &str, args: Value) -> DaqResult<bool> {
        DaqController::run_command(self, node, cmd, args)
    }
    fn filename(&self, index: usize) -> DaqResult<String> {
        DaqController::filename(self, index)
    }
    fn set_filename(&self, index: usize, value: String) -> DaqResult<()> {
        DaqController::set_filename(self, index, value)
    }
    fn description(&self, index: usize) -> DaqResult<String> {
        DaqController::description(self, index)
    }
    fn set_description(&self, index: usize, value: String) -> DaqResult<()> {
        DaqController::set_description(self, index, value)
    }
    fn duration(&self) -> u64 {
        DaqController::duration(self)
    }
    fn set_duration(&self, value: u64) -> DaqResult<()> {
        DaqController::set_duration(self, value)
    }
    fn use_monarch(&self) -> bool {
        DaqController::use_monarch(self)
    }
    fn set_use_monarch(&self, value: bool) {
        DaqController::set_use_monarch(self, value)
    }
    fn daq_status(&self) -> (DaqStatus, i32) {
        DaqController::daq_status(self)
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
