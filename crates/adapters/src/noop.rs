// SPDX-License-Identifier: MIT

//! No-op adapters: the default collaborators a deployment runs against
//! before wiring in a real graph runtime and real node types (both out of
//! scope for this workspace — spec §1 Non-goals). These are production
//! code, not test doubles: they let the daemon binary start, accept
//! presets, and exercise the full DAQ status machine with nothing
//! concrete attached downstream.

use crate::binder::{NodeBinder, NodeBuilder};
use crate::runtime::{GraphRuntime, RunOutcome};
use async_trait::async_trait;
use daq_core::DaqError;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A graph runtime that does nothing but wait to be cancelled. `resume`
/// and `pause` are accepted unconditionally.
#[derive(Clone)]
pub struct NoopGraphRuntime {
    cancel: CancellationToken,
}

impl Default for NoopGraphRuntime {
    fn default() -> Self {
        Self { cancel: CancellationToken::new() }
    }
}

impl NoopGraphRuntime {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphRuntime for NoopGraphRuntime {
    async fn resume(&self) -> Result<(), DaqError> {
        Ok(())
    }

    async fn pause(&self) -> Result<(), DaqError> {
        Ok(())
    }

    async fn cancel(&self) -> Result<(), DaqError> {
        self.cancel.cancel();
        Ok(())
    }

    async fn run(&self) -> RunOutcome {
        self.cancel.cancelled().await;
        RunOutcome::Normal
    }
}

/// A node binder that accepts and echoes back whatever configuration it is
/// given, and recognises no commands. Stands in for a concrete node type
/// until a deployment registers a real builder for that type.
#[derive(Clone, Default)]
pub struct NoopNodeBinder {
    config: Arc<Mutex<serde_json::Map<String, Value>>>,
}

impl NoopNodeBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> NodeBuilder {
        Arc::new(|| Arc::new(NoopNodeBinder::new()) as Arc<dyn NodeBinder>)
    }
}

impl NodeBinder for NoopNodeBinder {
    fn apply_config(&self, cfg: &Value) -> Result<(), DaqError> {
        if let Value::Object(map) = cfg {
            let mut current = self.config.lock();
            for (k, v) in map {
                current.insert(k.clone(), v.clone());
            }
        }
        Ok(())
    }

    fn dump_config(&self) -> Value {
        Value::Object(self.config.lock().clone())
    }

    fn run_command(&self, _cmd: &str, _args: &Value) -> Result<bool, DaqError> {
        Ok(false)
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
