// SPDX-License-Identifier: MIT

//! Shared error taxonomy (spec §7).
//!
//! Every crate in the workspace converts its own lower-level errors into
//! one of these variants at its boundary, the way the teacher's
//! `RuntimeError`/`LifecycleError` wrap `WalError`/`SnapshotError`/io errors.

use thiserror::Error;

/// The five error buckets from spec §7, plus the handful of fine-grained
/// reasons each bucket can carry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DaqError {
    /// Malformed preset, unknown node, bad connection. Never reaches the run loop.
    #[error("config error: {0}")]
    Config(String),

    /// Operation issued in the wrong state. No state change occurs.
    #[error("status error: {0}")]
    Status(String),

    /// Exception from a node or the file layer during a run. Fatal to the run.
    #[error("device error: {0}")]
    Device(String),

    /// Distinguished non-fatal node error class; triggers do-restart rather than error.
    #[error("nonfatal node error: {0}")]
    NonFatalNode(String),

    /// Cooperative cancellation, surfaced as a graceful stop.
    #[error("cancelled")]
    Cancelled,

    /// Lookup miss (preset name, node name, file index).
    #[error("not found: {0}")]
    NotFound(String),

    /// Positional index out of range (file index, filenames array).
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// Payload present but the wrong shape (e.g. `filenames` not an array).
    #[error("bad payload: {0}")]
    BadPayload(String),

    /// Routing-key path does not match any known pattern.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Node binder did not recognise the named command (returned `false`, not an error).
    #[error("method not found: {0}")]
    MethodNotFound(String),

    /// Online-reconfiguration call made outside activated/running.
    #[error("node bindings aren't available")]
    NoBindings,
}

impl DaqError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn status(msg: impl Into<String>) -> Self {
        Self::Status(msg.into())
    }

    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }
}

pub type DaqResult<T> = Result<T, DaqError>;
