// SPDX-License-Identifier: MIT

//! Node binder: the per-type adapter exposing configure/dump/command on an
//! active node instance (spec §3 "Node binding", §9 "callback-style
//! inheritance collapses into two orthogonal interfaces").
//!
//! Concrete DAQ node algorithms (UDP reception, FFT, trigger, file writers)
//! are out of scope (spec §1); this trait is the node-configuration-
//! capability half of that split. The node-execution-capability half
//! (start/pause/resume/cancel) belongs to the graph runtime as a whole, not
//! to individual nodes, per spec §4.2's design decision that the stream
//! manager never touches node state while the graph is running.

use daq_core::DaqError;
use serde_json::Value;

/// Applies configuration to, dumps configuration from, and runs named
/// commands on one active node instance.
///
/// Implementations must be safe for concurrent execution with the node's
/// own run loop (spec §5 "Shared-resource policy").
pub trait NodeBinder: Send + Sync {
    /// Merge `cfg` into the node's configuration. Unknown keys are left at
    /// their defaults, silently (spec §4.2).
    fn apply_config(&self, cfg: &Value) -> Result<(), DaqError>;

    /// Dump the node's current configuration.
    fn dump_config(&self) -> Value;

    /// Invoke a named command. Returns `Ok(false)` if the node does not
    /// recognise `cmd` (reported by the caller as `method-not-found`);
    /// returns `Err` for an actual device error encountered while running
    /// a recognised command.
    fn run_command(&self, cmd: &str, args: &Value) -> Result<bool, DaqError>;
}

/// A factory for a node type: builds a fresh (binder, logical-name-scoped)
/// instance. The stream manager looks these up by `NodeSpec::node_type`.
pub type NodeBuilder = std::sync::Arc<dyn Fn() -> std::sync::Arc<dyn NodeBinder> + Send + Sync>;

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// In-memory node binder for tests: `apply_config`/`dump_config` merge
    /// into a JSON object; `run_command` recognises whatever commands were
    /// registered via [`FakeNodeBinder::with_command`].
    #[derive(Clone)]
    pub struct FakeNodeBinder {
        config: Arc<Mutex<serde_json::Map<String, Value>>>,
        commands: Arc<Mutex<HashMap<String, bool>>>,
        fail_apply: Arc<Mutex<Option<DaqError>>>,
    }

    impl Default for FakeNodeBinder {
        fn default() -> Self {
            Self {
                config: Arc::new(Mutex::new(serde_json::Map::new())),
                commands: Arc::new(Mutex::new(HashMap::new())),
                fail_apply: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl FakeNodeBinder {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register `name` as a recognised command that succeeds.
        pub fn with_command(self, name: &str) -> Self {
            self.commands.lock().insert(name.to_string(), true);
            self
        }

        pub fn fail_apply_with(&self, err: DaqError) {
            *self.fail_apply.lock() = Some(err);
        }

        pub fn builder() -> NodeBuilder {
            Arc::new(|| Arc::new(FakeNodeBinder::new()) as Arc<dyn NodeBinder>)
        }
    }

    impl NodeBinder for FakeNodeBinder {
        fn apply_config(&self, cfg: &Value) -> Result<(), DaqError> {
            if let Some(err) = self.fail_apply.lock().clone() {
                return Err(err);
            }
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

        fn run_command(&self, cmd: &str, _args: &Value) -> Result<bool, DaqError> {
            Ok(self.commands.lock().get(cmd).copied().unwrap_or(false))
        }
    }

    /// A builder closure producing fresh [`FakeNodeBinder`]s that already
    /// recognise `cmd`.
    pub fn builder_with_command(cmd: &'static str) -> NodeBuilder {
        Arc::new(move || Arc::new(FakeNodeBinder::new().with_command(cmd)) as Arc<dyn NodeBinder>)
    }
}

#[cfg(test)]
#[path = "binder_tests.rs"]
mod tests;
