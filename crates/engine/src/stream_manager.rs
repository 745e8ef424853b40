// SPDX-License-Identifier: MIT

//! Stream manager (spec §4.2): builds, owns, and dismantles the active
//! graph. Never touches node state while the graph is running — all
//! online mutation goes through [`bindings`](StreamManager::bindings) and
//! is the caller's synchronisation responsibility (spec §5).

use crate::preset_registry::PresetRegistry;
use daq_adapters::{GraphRuntime, NodeBinder, NodeBuilder, RuntimeHandle};
use daq_core::{DaqError, DaqResult};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

struct ActiveGraph {
    preset_name: String,
    bindings: HashMap<String, Arc<dyn NodeBinder>>,
    run_order: Vec<String>,
}

struct RuntimeSlot<R> {
    runtime: Option<Arc<R>>,
    generation: u64,
    acquired: bool,
}

/// Instantiates, configures, connects, and tears down a node graph from a
/// preset; exposes active-node bindings for online reconfiguration.
///
/// Generic over the external [`GraphRuntime`] type so tests (and the
/// daemon) can swap in a fake without touching this module.
pub struct StreamManager<R: GraphRuntime> {
    registry: PresetRegistry,
    node_builders: HashMap<String, NodeBuilder>,
    runtime_factory: Arc<dyn Fn() -> R + Send + Sync>,
    graph: Mutex<Option<ActiveGraph>>,
    runtime: Mutex<RuntimeSlot<R>>,
    /// The `(preset_name, configs)` of the most recent successful
    /// `configure`, kept around so [`reconfigure_if_needed`](Self::reconfigure_if_needed)
    /// can rebuild an equivalent graph after `teardown` destroyed it.
    last_configure: Mutex<Option<(String, HashMap<String, serde_json::Value>)>>,
}

impl<R: GraphRuntime> StreamManager<R> {
    pub fn new(
        registry: PresetRegistry,
        node_builders: HashMap<String, NodeBuilder>,
        runtime_factory: impl Fn() -> R + Send + Sync + 'static,
    ) -> Self {
        Self {
            registry,
            node_builders,
            runtime_factory: Arc::new(runtime_factory),
            graph: Mutex::new(None),
            runtime: Mutex::new(RuntimeSlot { runtime: None, generation: 0, acquired: false }),
            last_configure: Mutex::new(None),
        }
    }

    /// Build the graph named by `preset_name`, applying `configs` (logical
    /// node name → config map) to each instantiated node. Only callable
    /// when no graph is live.
    pub fn configure(&self, preset_name: &str, configs: &HashMap<String, serde_json::Value>) -> DaqResult<()> {
        if self.graph.lock().is_some() {
            return Err(DaqError::status("a graph is already configured"));
        }

        let preset = self.registry.get(preset_name)?;
        let mut bindings = HashMap::with_capacity(preset.nodes.len());
        for node in &preset.nodes {
            let builder = self
                .node_builders
                .get(&node.node_type)
                .ok_or_else(|| DaqError::config(format!("unknown node type {:?}", node.node_type)))?;
            let binder = builder();
            if let Some(cfg) = configs.get(&node.name) {
                binder.apply_config(cfg).map_err(|e| DaqError::config(format!("{}: {e}", node.name)))?;
            }
            if bindings.insert(node.name.clone(), binder).is_some() {
                return Err(DaqError::config(format!("duplicate logical node name {:?}", node.name)));
            }
        }

        for conn in &preset.connections {
            if !bindings.contains_key(&conn.src_node) {
                return Err(DaqError::config(format!("unknown node name {:?}", conn.src_node)));
            }
            if !bindings.contains_key(&conn.dst_node) {
                return Err(DaqError::config(format!("unknown node name {:?}", conn.dst_node)));
            }
        }

        let run_order = topological_run_order(&preset);
        tracing::info!(preset = %preset_name, nodes = bindings.len(), "graph configured");
        *self.graph.lock() = Some(ActiveGraph { preset_name: preset_name.to_string(), bindings, run_order });
        *self.last_configure.lock() = Some((preset_name.to_string(), configs.clone()));
        Ok(())
    }

    /// Rebuild the graph from the most recent successful `configure` call,
    /// if `teardown` tore it down since. A no-op if a graph is already
    /// live. Node bindings are destroyed every deactivation (spec §3
    /// "Node binding" invariant), but a later `activate` must still
    /// produce an equivalent graph (spec §8 round-trip: "`activate;
    /// deactivate; activate` leaves... bindings identical in shape to the
    /// first activation").
    pub fn reconfigure_if_needed(&self) -> DaqResult<()> {
        if self.graph.lock().is_some() {
            return Ok(());
        }
        let last = self.last_configure.lock().clone();
        let (preset_name, configs) =
            last.ok_or_else(|| DaqError::status("no graph has ever been configured"))?;
        self.configure(&preset_name, &configs)
    }

    /// Whether the underlying runtime needs to be recreated before the next
    /// activation (it was consumed by a previous run, or none exists yet).
    pub fn must_reset(&self) -> bool {
        self.runtime.lock().runtime.is_none()
    }

    /// Recreate the underlying graph runtime. The runtime is single-use per
    /// activation; this must be called whenever [`must_reset`](Self::must_reset)
    /// returns true, before [`acquire_runtime`](Self::acquire_runtime).
    pub fn reset(&self) -> DaqResult<()> {
        if self.graph.lock().is_none() {
            return Err(DaqError::config("no graph configured"));
        }
        let mut slot = self.runtime.lock();
        slot.runtime = Some(Arc::new((self.runtime_factory)()));
        slot.generation += 1;
        slot.acquired = false;
        Ok(())
    }

    /// Yield the exclusive ticket to run the graph.
    pub fn acquire_runtime(&self) -> DaqResult<RuntimeHandle<R>> {
        let mut slot = self.runtime.lock();
        if slot.acquired {
            return Err(DaqError::status("graph runtime already acquired"));
        }
        let runtime = slot.runtime.clone().ok_or_else(|| DaqError::status("no graph configured"))?;
        slot.acquired = true;
        Ok(RuntimeHandle::new(runtime, slot.generation))
    }

    /// Return the ticket. The runtime is single-use per activation, so this
    /// also marks it consumed — the next activation must call
    /// [`reset`](Self::reset) again.
    pub fn release_runtime(&self, handle: RuntimeHandle<R>) {
        let mut slot = self.runtime.lock();
        if slot.generation == handle.generation() {
            slot.acquired = false;
            slot.runtime = None;
        }
    }

    /// Live view of (logical name → binder) for on-line config. Undefined
    /// outside activated/running; callers enforce that via `DaqStatus`.
    pub fn bindings(&self) -> HashMap<String, Arc<dyn NodeBinder>> {
        self.graph.lock().as_ref().map(|g| g.bindings.clone()).unwrap_or_default()
    }

    pub fn binding(&self, logical_name: &str) -> Option<Arc<dyn NodeBinder>> {
        self.graph.lock().as_ref().and_then(|g| g.bindings.get(logical_name).cloned())
    }

    /// Serialisation of node execution order used by the runtime.
    pub fn run_string(&self) -> String {
        self.graph.lock().as_ref().map(|g| g.run_order.join(" -> ")).unwrap_or_default()
    }

    pub fn active_preset_name(&self) -> Option<String> {
        self.graph.lock().as_ref().map(|g| g.preset_name.clone())
    }

    /// Tear down the active graph's bindings. Bindings are destroyed only
    /// when transitioning back to deactivated (spec §3 "Node binding"
    /// invariant); the runtime ticket is released separately.
    pub fn teardown(&self) {
        *self.graph.lock() = None;
    }
}

/// Kahn's-algorithm topological sort of the preset's connections (dst
/// depends on src); nodes with no edges keep their declaration order.
fn topological_run_order(preset: &daq_core::Preset) -> Vec<String> {
    let mut in_degree: HashMap<&str, usize> = preset.nodes.iter().map(|n| (n.name.as_str(), 0)).collect();
    let mut edges: HashMap<&str, Vec<&str>> = HashMap::new();
    for conn in &preset.connections {
        *in_degree.entry(conn.dst_node.as_str()).or_insert(0) += 1;
        edges.entry(conn.src_node.as_str()).or_default().push(conn.dst_node.as_str());
    }

    let mut queue: VecDeque<&str> =
        preset.nodes.iter().map(|n| n.name.as_str()).filter(|n| in_degree[n] == 0).collect();
    let mut visited: HashSet<&str> = HashSet::new();
    let mut order = Vec::with_capacity(preset.nodes.len());

    while let Some(node) = queue.pop_front() {
        if !visited.insert(node) {
            continue;
        }
        order.push(node.to_string());
        if let Some(downstream) = edges.get(node) {
            for &next in downstream {
                if let Some(deg) = in_degree.get_mut(next) {
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        queue.push_back(next);
                    }
                }
            }
        }
    }

    // A cycle (should be impossible given preset validation never forms
    // one deliberately) leaves some nodes unvisited; append them in
    // declaration order rather than silently dropping them.
    for node in &preset.nodes {
        if !visited.contains(node.name.as_str()) {
            order.push(node.name.clone());
        }
    }
    order
}

#[cfg(test)]
#[path = "stream_manager_tests.rs"]
mod tests;
